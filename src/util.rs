/// Last element of a `/`-separated path, ignoring trailing slashes.
///
/// An empty path yields `"."` and a path made only of slashes yields `"/"`.
pub fn base_name(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }

    match trimmed.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => trimmed.to_string(),
    }
}

/// Quotes `arg` for a POSIX shell.
pub fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Quotes a remote path for the shell that runs `scp -t`, leaving a leading
/// `~/` unquoted so it still expands to the login user's home.
pub fn quote_remote_path(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => format!("~/{}", shell_quote(rest)),
        None if path == "~" => path.to_string(),
        None => shell_quote(path),
    }
}

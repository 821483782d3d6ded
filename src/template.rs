use std::{collections::BTreeMap, ffi::OsString, io};

use minijinja::Environment;

use crate::error::{Error, Result};

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("could not read template")]
    Read(#[source] io::Error),

    #[error(transparent)]
    Syntax(#[from] minijinja::Error),
}

/// Variables available to a template, keyed by environment variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars(BTreeMap<String, String>);

impl TemplateVars {
    /// Builds the map from `NAME=value` entries, splitting on the first `=`.
    /// Entries without `=` are skipped.
    #[cfg(test)]
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            entries
                .into_iter()
                .filter_map(|entry| {
                    entry
                        .as_ref()
                        .split_once('=')
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                })
                .collect(),
        )
    }

    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self::from_vars_os(std::env::vars_os())
    }

    fn from_vars_os(vars: impl Iterator<Item = (OsString, OsString)>) -> Self {
        Self(
            vars.filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    tracing::debug!(?name, "skipping environment variable that is not UTF-8");
                    None
                }
            })
            .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TemplateVars {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Parses `source` as a template and renders it once against `vars`.
///
/// Undefined variables render as empty strings.
pub fn render(source: &str, vars: &TemplateVars) -> Result<String> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);

    let template = env
        .template_from_str(source)
        .map_err(|err| Error::TemplateParse(err.into()))?;

    template.render(&vars.0).map_err(Error::TemplateExec)
}

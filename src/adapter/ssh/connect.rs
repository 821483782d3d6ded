use std::{
    io,
    net::{TcpStream, ToSocketAddrs},
};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use ssh2::{HashType, Session};
use tracing::debug;

use crate::config::AuthMethod;

pub(super) fn try_connection(address: &str) -> io::Result<TcpStream> {
    let mut last_error = None;

    for addr in address.to_socket_addrs()? {
        match TcpStream::connect(addr) {
            Ok(stream) => return Ok(stream),
            Err(err) => {
                debug!(%addr, %err, "connection attempt failed");
                last_error = Some(err);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("{address} did not resolve to any address"),
        )
    }))
}

/// Logs the host key fingerprint without checking it against anything.
pub(super) fn accept_host_key(session: &Session) {
    if let Some(hash) = session.host_key_hash(HashType::Sha256) {
        debug!(
            fingerprint = %format!("SHA256:{}", STANDARD_NO_PAD.encode(hash)),
            "accepting host key without verification"
        );
    }
}

/// Offers each method in turn until the server accepts one.
pub(super) fn authenticate(
    session: &Session,
    username: &str,
    auth: &[AuthMethod],
) -> io::Result<()> {
    let mut last_error = None;

    for method in auth {
        let attempt = match method {
            AuthMethod::Password(password) => session.userauth_password(username, password),
            AuthMethod::PublicKey(key) => {
                debug!(algorithm = key.algorithm(), "offering private key");
                session.userauth_pubkey_memory(username, None, key.pem(), None)
            }
        };

        match attempt {
            Ok(()) if session.authenticated() => {
                debug!(method = method.name(), "authenticated");
                return Ok(());
            }
            Ok(()) => {}
            Err(err) => {
                debug!(method = method.name(), %err, "authentication method rejected");
                last_error = Some(err);
            }
        }
    }

    let tried = auth.iter().map(AuthMethod::name).collect::<Vec<_>>().join(", ");
    let reason = last_error.map(|err| format!(": {err}")).unwrap_or_default();

    Err(io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("unable to authenticate as {username} (tried {tried}){reason}"),
    ))
}

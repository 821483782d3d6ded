use std::io::{self, Read, Write};

use ssh2::Session;
use tracing::debug;

use crate::{
    adapter::ssh::{
        connect::{accept_host_key, authenticate, try_connection},
        exec::ExecChannel,
    },
    config::AuthMethod,
};

mod connect;
pub mod exec;
pub mod transfer;

/// Opens authenticated sessions to a remote host.
pub trait Connector {
    type Session: RemoteSession;

    fn connect(
        &self,
        address: &str,
        username: &str,
        auth: &[AuthMethod],
    ) -> io::Result<Self::Session>;
}

pub trait RemoteSession {
    type Channel: RemoteChannel;

    fn open_channel(&self) -> io::Result<Self::Channel>;
}

/// A session channel that can run one command and exchange bytes with it.
pub trait RemoteChannel: Read + Write {
    fn exec(&mut self, command: &str) -> io::Result<()>;

    /// Sends EOF, waits for the remote side to close the channel and returns
    /// the command's exit status.
    fn finish(&mut self) -> io::Result<i32>;
}

/// Connects over SSH with libssh2.
///
/// The remote host key is accepted without verification. Pipelines commonly
/// target hosts with fresh or self-signed keys and no known_hosts file, so no
/// strict mode is offered; the key fingerprint is logged at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct SshConnector;

impl Connector for SshConnector {
    type Session = SSHSession;

    fn connect(&self, address: &str, username: &str, auth: &[AuthMethod]) -> io::Result<SSHSession> {
        SSHSession::open(address, username, auth)
    }
}

pub struct SSHSession(Session);

impl SSHSession {
    pub fn open(address: &str, username: &str, auth: &[AuthMethod]) -> io::Result<Self> {
        let stream = try_connection(address)?;
        debug!(
            peer = %stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or("[host]".to_string()),
            "tcp connection established"
        );

        let mut session = Session::new()?;
        session.set_tcp_stream(stream);
        session.handshake()?;
        accept_host_key(&session);

        authenticate(&session, username, auth)?;

        if let Some(banner) = session.banner() {
            debug!(banner, "server banner");
        }

        Ok(Self(session))
    }
}

impl RemoteSession for SSHSession {
    type Channel = ExecChannel;

    fn open_channel(&self) -> io::Result<ExecChannel> {
        Ok(ExecChannel::new(self.0.channel_session()?))
    }
}

impl Drop for SSHSession {
    fn drop(&mut self) {
        if let Err(err) = self.0.disconnect(None, "closing session", None) {
            debug!(%err, "could not disconnect cleanly");
        }
    }
}

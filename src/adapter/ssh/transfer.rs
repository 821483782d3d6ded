use std::io::{self, Read};

use tracing::trace;

use super::RemoteChannel;
use crate::util::quote_remote_path;

#[derive(Debug, thiserror::Error)]
pub enum ScpError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("remote scp: {0}")]
    Remote(String),

    #[error("unexpected response byte {0:#04x} from remote scp")]
    UnexpectedResponse(u8),

    #[error("remote scp closed the channel before acknowledging")]
    UnexpectedEof,

    #[error("file name {0:?} cannot be sent over scp")]
    InvalidName(String),

    #[error("content ended after {sent} of {expected} bytes")]
    ShortContent { sent: u64, expected: u64 },

    #[error("remote scp exited with status {0}")]
    ExitStatus(i32),
}

/// Metadata announced in the `C` record before the content.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader<'a> {
    pub mode: u32,
    pub size: u64,
    pub name: &'a str,
}

impl FileHeader<'_> {
    fn record(&self) -> String {
        format!("C{:04o} {} {}\n", self.mode & 0o777, self.size, self.name)
    }
}

/// Runs `scp -t` for `target` on `channel` and sends one file through it.
///
/// Exactly `header.size` bytes are read from `content`. Returns the number of
/// content bytes written.
pub fn send_file<C, R>(
    channel: &mut C,
    target: &str,
    header: &FileHeader,
    content: &mut R,
) -> Result<u64, ScpError>
where
    C: RemoteChannel,
    R: Read,
{
    if header.name.is_empty() || header.name.contains(['/', '\n']) {
        return Err(ScpError::InvalidName(header.name.to_string()));
    }

    channel.exec(&format!("scp -qt {}", quote_remote_path(target)))?;
    read_ack(channel)?;

    let record = header.record();
    trace!(record = record.trim_end(), "sending file record");
    channel.write_all(record.as_bytes())?;
    channel.flush()?;
    read_ack(channel)?;

    let sent = io::copy(&mut content.take(header.size), channel)?;
    if sent != header.size {
        return Err(ScpError::ShortContent {
            sent,
            expected: header.size,
        });
    }

    channel.write_all(&[0])?;
    channel.flush()?;
    read_ack(channel)?;

    match channel.finish()? {
        0 => Ok(sent),
        status => Err(ScpError::ExitStatus(status)),
    }
}

/// Reads one response from the sink: `0` is success, `1` and `2` carry an
/// error message terminated by a newline.
fn read_ack(channel: &mut impl Read) -> Result<(), ScpError> {
    let code = read_byte(channel)?.ok_or(ScpError::UnexpectedEof)?;

    match code {
        0 => {
            trace!("ack");
            Ok(())
        }
        1 | 2 => {
            let mut message = Vec::new();
            while let Some(byte) = read_byte(channel)? {
                if byte == b'\n' {
                    break;
                }
                message.push(byte);
            }
            Err(ScpError::Remote(
                String::from_utf8_lossy(&message).trim().to_string(),
            ))
        }
        other => Err(ScpError::UnexpectedResponse(other)),
    }
}

fn read_byte(reader: &mut impl Read) -> io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::io::{Cursor, Write};

    use super::*;

    /// Channel double: replays scripted sink responses and records everything
    /// written to it.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedChannel {
        pub responses: Cursor<Vec<u8>>,
        pub written: Vec<u8>,
        pub commands: Vec<String>,
        pub exit_status: i32,
        pub finished: bool,
    }

    impl ScriptedChannel {
        pub fn new(responses: &[u8]) -> Self {
            Self {
                responses: Cursor::new(responses.to_vec()),
                ..Default::default()
            }
        }
    }

    impl Read for ScriptedChannel {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.responses.read(buf)
        }
    }

    impl Write for ScriptedChannel {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl RemoteChannel for ScriptedChannel {
        fn exec(&mut self, command: &str) -> io::Result<()> {
            self.commands.push(command.to_string());
            Ok(())
        }

        fn finish(&mut self) -> io::Result<i32> {
            self.finished = true;
            Ok(self.exit_status)
        }
    }

    fn header(size: u64) -> FileHeader<'static> {
        FileHeader {
            mode: 0o100644,
            size,
            name: "hello.txt",
        }
    }

    #[test]
    fn sends_record_content_and_terminator() {
        let mut channel = ScriptedChannel::new(&[0, 0, 0]);

        let sent = send_file(&mut channel, "hello.txt", &header(2), &mut &b"hi"[..]).unwrap();

        assert_eq!(sent, 2);
        assert_eq!(channel.commands, ["scp -qt 'hello.txt'"]);
        assert_eq!(channel.written, b"C0644 2 hello.txt\nhi\0");
        assert!(channel.finished);
    }

    #[test]
    fn sends_only_announced_size() {
        let mut channel = ScriptedChannel::new(&[0, 0, 0]);

        send_file(&mut channel, "/srv/t", &header(3), &mut &b"abcdef"[..]).unwrap();

        assert_eq!(channel.written, b"C0644 3 hello.txt\nabc\0");
    }

    #[test]
    fn short_content_is_an_error() {
        let mut channel = ScriptedChannel::new(&[0, 0, 0]);

        let err = send_file(&mut channel, "t", &header(5), &mut &b"ab"[..]).unwrap_err();

        assert!(matches!(err, ScpError::ShortContent { sent: 2, expected: 5 }));
        assert!(!channel.finished);
    }

    #[test]
    fn remote_error_message_is_reported() {
        let mut responses = vec![0, 1];
        responses.extend_from_slice(b"scp: /root/x: Permission denied\n");
        let mut channel = ScriptedChannel::new(&responses);

        let err = send_file(&mut channel, "/root/x", &header(2), &mut &b"hi"[..]).unwrap_err();

        match err {
            ScpError::Remote(message) => assert_eq!(message, "scp: /root/x: Permission denied"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(channel.written, b"C0644 2 hello.txt\n");
    }

    #[test]
    fn closed_channel_is_an_error() {
        let mut channel = ScriptedChannel::new(&[]);

        let err = send_file(&mut channel, "t", &header(2), &mut &b"hi"[..]).unwrap_err();

        assert!(matches!(err, ScpError::UnexpectedEof));
        assert!(channel.written.is_empty());
    }

    #[test]
    fn garbage_response_is_an_error() {
        let mut channel = ScriptedChannel::new(b"E");

        let err = send_file(&mut channel, "t", &header(2), &mut &b"hi"[..]).unwrap_err();

        assert!(matches!(err, ScpError::UnexpectedResponse(b'E')));
    }

    #[test]
    fn non_zero_exit_status_is_an_error() {
        let mut channel = ScriptedChannel::new(&[0, 0, 0]);
        channel.exit_status = 1;

        let err = send_file(&mut channel, "t", &header(2), &mut &b"hi"[..]).unwrap_err();

        assert!(matches!(err, ScpError::ExitStatus(1)));
    }

    #[test]
    fn rejects_names_that_break_the_record() {
        let mut channel = ScriptedChannel::new(&[0, 0, 0]);
        let header = FileHeader {
            mode: 0o644,
            size: 0,
            name: "evil\nC0777 1 x",
        };

        let err = send_file(&mut channel, "t", &header, &mut io::empty()).unwrap_err();

        assert!(matches!(err, ScpError::InvalidName(_)));
        assert!(channel.commands.is_empty());
    }

    #[test]
    fn quotes_target_for_the_remote_shell() {
        let mut channel = ScriptedChannel::new(&[0, 0, 0]);

        send_file(&mut channel, "it's a dir/", &header(0), &mut io::empty()).unwrap();

        assert_eq!(channel.commands, [r"scp -qt 'it'\''s a dir/'"]);
    }

    #[test]
    fn home_relative_target_is_left_to_the_remote_shell() {
        let mut channel = ScriptedChannel::new(&[0, 0, 0]);

        send_file(&mut channel, "~/www/my site/", &header(0), &mut io::empty()).unwrap();

        assert_eq!(channel.commands, ["scp -qt ~/'www/my site/'"]);
    }
}

use std::io::{self, Read, Write};

use ssh2::Channel;

use super::RemoteChannel;

pub struct ExecChannel {
    channel: Channel,
}

impl ExecChannel {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

impl Read for ExecChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.channel.read(buf)
    }
}

impl Write for ExecChannel {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.channel.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.channel.flush()
    }
}

impl RemoteChannel for ExecChannel {
    fn exec(&mut self, command: &str) -> io::Result<()> {
        Ok(self.channel.exec(command)?)
    }

    fn finish(&mut self) -> io::Result<i32> {
        self.channel.send_eof()?;
        self.channel.wait_eof()?;
        self.channel.close()?;
        self.channel.wait_close()?;

        Ok(self.channel.exit_status()?)
    }
}

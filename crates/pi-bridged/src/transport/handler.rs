//! Connection handling abstractions for the bridge listener.

use std::io::{self, Read, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;

/// Stream accepted by the bridge listener.
#[derive(Debug)]
pub(crate) struct ConnectionStream(UnixStream);

impl ConnectionStream {
    pub(crate) const fn new(stream: UnixStream) -> Self {
        Self(stream)
    }

    /// Closes both directions of the connection.
    pub(crate) fn close(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }

    /// Signals end of output while leaving the read side open.
    pub(crate) fn close_write(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Write)
    }

    fn shutdown(&self, how: Shutdown) -> io::Result<()> {
        match self.0.shutdown(how) {
            Err(error) if error.kind() != io::ErrorKind::NotConnected => Err(error),
            _ => Ok(()),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

/// Reads one chunk from the stream, retrying on interrupts.
pub(crate) fn read_chunk<R: Read>(stream: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
}

//! Socket transport for the bridge client.

use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::time::Duration;

use socket2::{Domain, SockAddr, Socket, Type};

use pi_bridge_config::SocketAddress;

use super::AppError;

pub(super) const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

pub(super) fn connect(address: &SocketAddress) -> Result<UnixStream, AppError> {
    connect_unix(address).map_err(|source| AppError::Connect {
        socket: address.to_string(),
        source,
    })
}

fn connect_unix(address: &SocketAddress) -> io::Result<UnixStream> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    let sock_addr = SockAddr::unix(address.as_std_path())?;
    socket.connect_timeout(&sock_addr, CONNECTION_TIMEOUT)?;
    let stream: UnixStream = socket.into();
    stream.set_read_timeout(Some(CONNECTION_TIMEOUT))?;
    Ok(stream)
}

/// Writes `request` as one line and reads the single response line.
pub(super) fn exchange(stream: UnixStream, request: &[u8]) -> Result<String, AppError> {
    let mut writer = &stream;
    writer.write_all(request).map_err(AppError::SendRequest)?;
    writer.write_all(b"\n").map_err(AppError::SendRequest)?;
    writer.flush().map_err(AppError::SendRequest)?;

    let mut line = String::new();
    let read = BufReader::new(&stream)
        .read_line(&mut line)
        .map_err(AppError::ReadResponse)?;
    if read == 0 {
        return Err(AppError::MissingResponse);
    }
    Ok(line.trim_end_matches('\n').to_owned())
}

//! Bridge server harness bound under a temporary socket directory.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use pi_bridge_config::{Config, SocketAddress};

use crate::host::Host;
use crate::server::{BridgeServer, StartError};

use super::host::RecordingHost;

/// A recording host and server sharing one temporary socket directory.
pub struct TestSession {
    dir: Arc<TempDir>,
    pub host: Arc<RecordingHost>,
    pub server: BridgeServer<RecordingHost>,
}

impl TestSession {
    /// Builds an unbound session for `working_directory`.
    pub fn new(working_directory: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temporary socket directory");
        Self::in_directory(Arc::new(dir), working_directory)
    }

    /// Builds a second session with the same working directory and socket
    /// directory as `other`, so both derive the same address.
    pub fn sharing_directory_with(other: &Self) -> Self {
        Self::in_directory(Arc::clone(&other.dir), &other.host.working_directory())
    }

    fn in_directory(dir: Arc<TempDir>, working_directory: &str) -> Self {
        let host = Arc::new(RecordingHost::new(working_directory));
        let server = BridgeServer::new(Arc::clone(&host), config_for(&dir));
        Self { dir, host, server }
    }

    /// Configuration pointing at this session's socket directory.
    pub fn config(&self) -> Config {
        config_for(&self.dir)
    }

    /// Starts the server.
    pub fn start(&mut self) -> Result<SocketAddress, StartError> {
        self.server.on_session_start()
    }

    /// Address the session derives for its working directory.
    pub fn expected_address(&self) -> SocketAddress {
        self.config().socket_address(&self.host.working_directory())
    }
}

fn config_for(dir: &TempDir) -> Config {
    let socket_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .expect("temporary socket directory was not valid UTF-8");
    Config {
        socket_dir: Some(socket_dir),
        ..Config::default()
    }
}

/// Sends `payload` on a fresh connection and returns every line received
/// before the server closes it.
///
/// Reading stops at the first error: a peer that closes with unread request
/// bytes resets the connection after the response has been delivered.
pub fn connect_and_send(address: &SocketAddress, payload: &[u8]) -> Vec<String> {
    let mut stream = UnixStream::connect(address.as_std_path()).expect("connect client");
    stream.write_all(payload).expect("write request");
    // The server may already have answered and closed.
    let _ = stream.shutdown(std::net::Shutdown::Write);
    BufReader::new(stream)
        .lines()
        .map_while(Result::ok)
        .collect()
}

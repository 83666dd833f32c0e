//! Listener implementation for bridge sockets.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use pi_bridge_config::SocketAddress;

use super::{ConnectionHandler, ConnectionStream, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
const ACCEPT_THREAD_NAME: &str = "pi-bridge-accept";
const CONNECTION_THREAD_PREFIX: &str = "pi-bridge-conn-";

/// Listener bound to a bridge socket path.
#[derive(Debug)]
pub(crate) struct SocketListener {
    address: SocketAddress,
    listener: UnixListener,
}

impl SocketListener {
    /// Binds `address`, replacing a stale socket left by a dead session.
    pub(crate) fn bind(address: &SocketAddress) -> Result<Self, ListenerError> {
        let listener = bind_unix(address.as_std_path())?;
        Ok(Self {
            address: address.clone(),
            listener,
        })
    }

    pub(crate) const fn address(&self) -> &SocketAddress {
        &self.address
    }

    /// Starts the accept loop on a named background thread.
    ///
    /// The socket file is removed again if the loop cannot be started.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.listener.set_nonblocking(true) {
            cleanup_unix_socket(&self.address);
            return Err(ListenerError::NonBlocking { source });
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let address = self.address.clone();
        let spawned = thread::Builder::new()
            .name(ACCEPT_THREAD_NAME.to_owned())
            .spawn(move || AcceptLoop::new(self, handler).run(&shutdown_flag));
        match spawned {
            Ok(handle) => Ok(ListenerHandle {
                shutdown,
                handle: Some(handle),
            }),
            Err(source) => {
                cleanup_unix_socket(&address);
                Err(ListenerError::Spawn { source })
            }
        }
    }
}

/// Handle to the background accept thread.
#[derive(Debug)]
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

struct AcceptLoop {
    listener: SocketListener,
    handler: Arc<dyn ConnectionHandler>,
    accepted: u64,
    last_error: Option<io::ErrorKind>,
}

impl AcceptLoop {
    fn new(listener: SocketListener, handler: Arc<dyn ConnectionHandler>) -> Self {
        Self {
            listener,
            handler,
            accepted: 0,
            last_error: None,
        }
    }

    fn run(mut self, shutdown: &AtomicBool) {
        info!(
            target: LISTENER_TARGET,
            socket = %self.listener.address,
            "socket listener active"
        );
        while !shutdown.load(Ordering::SeqCst) {
            match accept_connection(&self.listener.listener) {
                Ok(Some(stream)) => {
                    self.last_error = None;
                    self.dispatch(stream);
                }
                Ok(None) => thread::sleep(ACCEPT_BACKOFF),
                Err(error) => {
                    self.report_accept_error(&error);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }

        cleanup_unix_socket(&self.listener.address);
        info!(
            target: LISTENER_TARGET,
            socket = %self.listener.address,
            accepted = self.accepted,
            "socket listener stopped"
        );
    }

    fn dispatch(&mut self, stream: ConnectionStream) {
        self.accepted += 1;
        let connection = self.accepted;
        let handler = Arc::clone(&self.handler);
        debug!(target: LISTENER_TARGET, connection, "connection accepted");
        let spawned = thread::Builder::new()
            .name(format!("{CONNECTION_THREAD_PREFIX}{connection}"))
            .spawn(move || handler.handle(stream));
        if let Err(error) = spawned {
            warn!(
                target: LISTENER_TARGET,
                connection,
                %error,
                "failed to spawn connection thread; dropping connection"
            );
        }
    }

    /// Logs each distinct accept failure once until an accept succeeds.
    fn report_accept_error(&mut self, error: &io::Error) {
        let kind = error.kind();
        if self.last_error != Some(kind) {
            warn!(target: LISTENER_TARGET, %error, "socket accept error");
        }
        self.last_error = Some(kind);
    }
}

fn accept_connection(listener: &UnixListener) -> io::Result<Option<ConnectionStream>> {
    match listener.accept() {
        Ok((stream, _)) => {
            stream.set_nonblocking(false)?;
            Ok(Some(ConnectionStream::new(stream)))
        }
        Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
        Err(error) => Err(error),
    }
}

fn bind_unix(path: &Path) -> Result<UnixListener, ListenerError> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if !metadata.file_type().is_socket() {
                return Err(ListenerError::UnixNotSocket {
                    path: path.display().to_string(),
                });
            }
            remove_stale_socket(path)?;
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ListenerError::UnixMetadata {
                path: path.display().to_string(),
                source,
            });
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::BindUnix {
        path: path.display().to_string(),
        source,
    })
}

/// Removes a socket file nobody listens on; a live listener is a conflict.
fn remove_stale_socket(path: &Path) -> Result<(), ListenerError> {
    match UnixStream::connect(path) {
        Ok(_stream) => Err(ListenerError::UnixInUse {
            path: path.display().to_string(),
        }),
        Err(error)
            if error.kind() == io::ErrorKind::ConnectionRefused
                || error.kind() == io::ErrorKind::NotFound =>
        {
            if let Err(error) = fs::remove_file(path) {
                debug!(
                    target: LISTENER_TARGET,
                    error = %error,
                    path = %path.display(),
                    "ignoring stale socket removal failure"
                );
            }
            Ok(())
        }
        Err(source) => Err(ListenerError::UnixConnect {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Removes the socket file, tolerating its absence.
pub(crate) fn cleanup_unix_socket(address: &SocketAddress) {
    if let Err(error) = fs::remove_file(address.as_std_path())
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            path = %address,
            "failed to remove unix socket file"
        );
    }
}

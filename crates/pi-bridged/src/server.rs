//! Session-scoped bridge server.
//!
//! A [`BridgeServer`] owns the listening socket for one host session. The
//! host calls [`BridgeServer::on_session_start`] when the session begins and
//! [`BridgeServer::on_session_shutdown`] when it ends; between the two the
//! server accepts connections and dispatches them into the host.

use std::mem;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use pi_bridge_config::{Config, SocketAddress, SocketPreparationError};

use crate::dispatch::BridgeConnectionHandler;
use crate::host::{Host, NotifyLevel};
use crate::transport::{ListenerError, ListenerHandle, SocketListener, cleanup_unix_socket};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// Status indicator key registered with the host.
pub const STATUS_KEY: &str = "nvim-bridge";

/// Status indicator text shown while the bridge is accepting.
pub const STATUS_TEXT: &str = "bridge:sock";

/// Errors raised while starting a session's listener.
#[derive(Debug, Error)]
pub enum StartError {
    /// The socket directory could not be prepared.
    #[error(transparent)]
    Socket(#[from] SocketPreparationError),
    /// Binding or starting the listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

#[derive(Debug)]
enum ServerState {
    Unbound,
    Accepting {
        address: SocketAddress,
        listener: ListenerHandle,
    },
}

/// Bridge server for one host session.
pub struct BridgeServer<H: ?Sized> {
    host: Arc<H>,
    config: Config,
    state: ServerState,
}

impl<H> BridgeServer<H>
where
    H: Host + ?Sized,
{
    /// Creates an unbound server for `host`.
    pub const fn new(host: Arc<H>, config: Config) -> Self {
        Self {
            host,
            config,
            state: ServerState::Unbound,
        }
    }

    /// Binds the session socket and starts accepting connections.
    ///
    /// The outcome is reported to the host UI either way. A server that is
    /// already accepting returns its address unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StartError`] when the socket directory cannot be prepared or
    /// the socket cannot be bound; the server then stays unbound.
    pub fn on_session_start(&mut self) -> Result<SocketAddress, StartError> {
        if let ServerState::Accepting { address, .. } = &self.state {
            debug!(target: SERVER_TARGET, socket = %address, "bridge already accepting");
            return Ok(address.clone());
        }

        let working_directory = self.host.working_directory();
        let address = self.config.socket_address(&working_directory);
        match self.start_listener(&address) {
            Ok(listener) => {
                info!(
                    target: SERVER_TARGET,
                    socket = %address,
                    working_directory = %working_directory,
                    "bridge accepting connections"
                );
                self.host
                    .notify(&format!("nvim bridge: {address}"), NotifyLevel::Info);
                self.host.set_status(STATUS_KEY, STATUS_TEXT);
                self.state = ServerState::Accepting {
                    address: address.clone(),
                    listener,
                };
                Ok(address)
            }
            Err(error) => {
                warn!(
                    target: SERVER_TARGET,
                    socket = %address,
                    %error,
                    "bridge failed to start"
                );
                self.host
                    .notify(&format!("nvim bridge error: {error}"), NotifyLevel::Error);
                Err(error)
            }
        }
    }

    fn start_listener(&self, address: &SocketAddress) -> Result<ListenerHandle, StartError> {
        address.prepare_filesystem()?;
        let listener = SocketListener::bind(address)?;
        debug!(target: SERVER_TARGET, socket = %listener.address(), "socket bound");
        let handler = Arc::new(BridgeConnectionHandler::new(
            Arc::clone(&self.host),
            self.config.max_frame_bytes(),
        ));
        Ok(listener.start(handler)?)
    }
}

impl<H: ?Sized> BridgeServer<H> {
    /// Stops accepting and removes the socket file.
    ///
    /// Safe to call repeatedly and without a prior start.
    pub fn on_session_shutdown(&mut self) {
        let ServerState::Accepting { address, listener } =
            mem::replace(&mut self.state, ServerState::Unbound)
        else {
            return;
        };

        listener.shutdown();
        if let Err(error) = listener.join() {
            warn!(target: SERVER_TARGET, %error, "listener thread did not stop cleanly");
        }
        cleanup_unix_socket(&address);
        info!(target: SERVER_TARGET, socket = %address, "bridge stopped");
    }

    /// Address the server is bound to, if accepting.
    pub const fn address(&self) -> Option<&SocketAddress> {
        match &self.state {
            ServerState::Accepting { address, .. } => Some(address),
            ServerState::Unbound => None,
        }
    }

    /// Returns true while the server accepts connections.
    pub const fn is_accepting(&self) -> bool {
        matches!(self.state, ServerState::Accepting { .. })
    }
}

impl<H: ?Sized> Drop for BridgeServer<H> {
    fn drop(&mut self) {
        self.on_session_shutdown();
    }
}

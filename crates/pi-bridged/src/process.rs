//! Process entry point for the standalone bridge.
//!
//! `pi-bridged` plays the host for one working directory: it loads
//! configuration, installs telemetry, starts a [`BridgeServer`] over an
//! [`EventStreamHost`] writing to stdout, and serves until a termination
//! signal arrives.

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use pi_bridge_config::{Config, WorkingDirError};

use crate::event_host::{EventStreamError, EventStreamHost};
use crate::server::{BridgeServer, StartError};
use crate::telemetry::{self, TelemetryError};

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors surfaced while running the standalone bridge.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry could not be installed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// The working-directory identity could not be resolved.
    #[error(transparent)]
    WorkingDir(#[from] WorkingDirError),
    /// The bridge could not start listening.
    #[error("failed to start bridge: {0}")]
    Start(#[from] StartError),
    /// Waiting for shutdown failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
    /// Flushing the event stream failed.
    #[error(transparent)]
    Events(#[from] EventStreamError),
}

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal {
    /// Blocks until shutdown should proceed.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] if the notification source cannot be set up.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

/// Runs the standalone bridge with process arguments, stdout and signals.
///
/// # Errors
///
/// Returns [`LaunchError`] when any stage of start-up or shutdown fails.
pub fn run_bridge<I>(args: I) -> Result<(), LaunchError>
where
    I: IntoIterator<Item = OsString>,
{
    let config = Config::load_from_iter(args).map_err(|source| LaunchError::Config { source })?;
    telemetry::initialise(&config)?;
    run_with(config, io::stdout(), &SystemShutdownSignal)
}

/// Runs the bridge with injected output and shutdown signal.
///
/// Start failures are fatal here: with no host UI to fall back on, a bridge
/// that cannot listen has nothing left to do.
///
/// # Errors
///
/// Returns [`LaunchError`] when the bridge cannot start, the signal source
/// fails, or the event stream cannot be flushed.
pub fn run_with<W, S>(config: Config, output: W, shutdown: &S) -> Result<(), LaunchError>
where
    W: Write + Send + 'static,
    S: ShutdownSignal + ?Sized,
{
    let working_dir = config.working_dir()?;
    let host = Arc::new(EventStreamHost::spawn(working_dir.as_str(), output));
    let mut server = BridgeServer::new(Arc::clone(&host), config);

    let outcome = serve_until_shutdown(&mut server, shutdown);
    server.on_session_shutdown();
    let flushed = host.finish();
    outcome?;
    flushed?;
    Ok(())
}

fn serve_until_shutdown<S>(
    server: &mut BridgeServer<EventStreamHost>,
    shutdown: &S,
) -> Result<(), LaunchError>
where
    S: ShutdownSignal + ?Sized,
{
    let address = server.on_session_start()?;
    info!(target: PROCESS_TARGET, socket = %address, "bridge ready");
    shutdown.wait()?;
    Ok(())
}

//! Shared configuration for the pi bridge binaries.
//!
//! Configuration layers (defaults, configuration files, `PI_BRIDGE_*`
//! environment variables and command-line flags) are merged by
//! [`ortho_config`]. Every field is optional; accessors resolve the built-in
//! defaults so callers never handle absent values themselves.
//!
//! The crate also owns socket address derivation, which the bridge server and
//! its clients must agree on byte for byte.

mod defaults;
mod logging;
mod socket;

use std::env;
use std::path::PathBuf;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_SOCKET_DIR, default_log_filter, default_log_format,
    default_socket_dir,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SOCKET_EXTENSION, SOCKET_PREFIX, SocketAddress, SocketPreparationError};

/// Resolved bridge configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PI_BRIDGE")]
pub struct Config {
    /// Directory holding bridge sockets.
    pub socket_dir: Option<Utf8PathBuf>,
    /// Working-directory identity served by the standalone bridge.
    pub working_dir: Option<Utf8PathBuf>,
    /// `tracing` filter expression.
    pub log_filter: Option<String>,
    /// Log output format.
    pub log_format: Option<LogFormat>,
    /// Upper bound on buffered bytes per connection; unbounded when absent.
    pub max_frame_bytes: Option<usize>,
}

impl Config {
    /// Directory holding bridge sockets.
    #[must_use]
    pub fn socket_dir(&self) -> &Utf8Path {
        self.socket_dir
            .as_deref()
            .unwrap_or_else(|| Utf8Path::new(DEFAULT_SOCKET_DIR))
    }

    /// Filter expression for the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    /// Output format for the tracing subscriber.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(default_log_format)
    }

    /// Optional cap on buffered bytes per connection.
    #[must_use]
    pub const fn max_frame_bytes(&self) -> Option<usize> {
        self.max_frame_bytes
    }

    /// Working-directory identity, falling back to the process directory.
    ///
    /// # Errors
    ///
    /// Returns [`WorkingDirError`] when the process directory cannot be read
    /// or is not valid UTF-8.
    pub fn working_dir(&self) -> Result<Utf8PathBuf, WorkingDirError> {
        if let Some(dir) = &self.working_dir {
            return Ok(dir.clone());
        }
        let current = env::current_dir().map_err(|source| WorkingDirError::Unavailable { source })?;
        Utf8PathBuf::from_path_buf(current).map_err(|path| WorkingDirError::NonUtf8 { path })
    }

    /// Derives the socket address serving `working_directory`.
    #[must_use]
    pub fn socket_address(&self, working_directory: &str) -> SocketAddress {
        SocketAddress::derive_in(self.socket_dir(), working_directory)
    }
}

/// Errors raised while resolving the working-directory identity.
#[derive(Debug, Error)]
pub enum WorkingDirError {
    /// The process working directory could not be read.
    #[error("failed to read current directory: {source}")]
    Unavailable {
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The process working directory is not valid UTF-8.
    #[error("current directory '{}' is not valid UTF-8", path.display())]
    NonUtf8 {
        /// Offending directory.
        path: PathBuf,
    },
}

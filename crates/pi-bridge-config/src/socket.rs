//! Socket address derivation for bridge sessions.
//!
//! Every working directory maps to one socket path so editors can reconnect
//! without any discovery step: the path embeds a short SHA-256 digest of the
//! working-directory string.

use std::fmt;
use std::fs::DirBuilder;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::defaults::DEFAULT_SOCKET_DIR;

/// File name prefix shared by every bridge socket.
pub const SOCKET_PREFIX: &str = "pi-bridge-";

/// File extension of bridge sockets.
pub const SOCKET_EXTENSION: &str = "sock";

/// Number of digest bytes embedded in the socket name (16 hex characters).
const DIGEST_PREFIX_BYTES: usize = 8;

/// Filesystem path of the socket serving one working directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocketAddress {
    path: Utf8PathBuf,
}

impl SocketAddress {
    /// Derives the address for `working_directory` under the shared temp
    /// directory.
    #[must_use]
    pub fn derive(working_directory: &str) -> Self {
        Self::derive_in(Utf8Path::new(DEFAULT_SOCKET_DIR), working_directory)
    }

    /// Derives the address for `working_directory` under `socket_dir`.
    #[must_use]
    pub fn derive_in(socket_dir: &Utf8Path, working_directory: &str) -> Self {
        let name = format!(
            "{SOCKET_PREFIX}{}.{SOCKET_EXTENSION}",
            digest_prefix(working_directory)
        );
        Self {
            path: socket_dir.join(name),
        }
    }

    /// Wraps an explicit socket path without derivation.
    #[must_use]
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the socket path.
    #[must_use]
    pub fn as_path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns the socket path as a standard library path.
    #[must_use]
    pub fn as_std_path(&self) -> &Path {
        self.path.as_std_path()
    }

    /// Ensures the socket's parent directory exists.
    ///
    /// Missing directories are created with owner-only permissions; existing
    /// ones are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`SocketPreparationError`] when the path has no parent or the
    /// directory cannot be created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(parent) = self.path.parent().filter(|dir| !dir.as_str().is_empty()) else {
            return Err(SocketPreparationError::MissingParent {
                path: self.path.clone(),
            });
        };
        if parent.is_dir() {
            return Ok(());
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

impl fmt::Display for SocketAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.path, formatter)
    }
}

impl AsRef<Path> for SocketAddress {
    fn as_ref(&self) -> &Path {
        self.as_std_path()
    }
}

fn digest_prefix(input: &str) -> String {
    Sha256::digest(input.as_bytes())
        .iter()
        .take(DIGEST_PREFIX_BYTES)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// Socket path has no parent directory.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Offending socket path.
        path: Utf8PathBuf,
    },
    /// Failed to create the socket directory.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

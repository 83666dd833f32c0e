//! Response serialization for the dispatch loop.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

const HEALTH_STATUS: &str = "ok";

/// The single response line a connection receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    /// Health probe answer.
    Health {
        /// Always `"ok"`.
        status: String,
        /// Working-directory identity of the session.
        cwd: String,
    },
    /// Request accepted and handed to the host.
    Accepted {
        /// Always `true`.
        ok: bool,
    },
    /// Request rejected.
    Error {
        /// Reason, one of the [`ValidationError`] display strings.
        error: String,
    },
}

impl BridgeResponse {
    /// Builds a health answer for `cwd`.
    #[must_use]
    pub fn health(cwd: impl Into<String>) -> Self {
        Self::Health {
            status: HEALTH_STATUS.to_owned(),
            cwd: cwd.into(),
        }
    }

    /// Builds the success answer.
    #[must_use]
    pub const fn ok() -> Self {
        Self::Accepted { ok: true }
    }

    /// Builds an error answer from a validation failure.
    #[must_use]
    pub fn from_error(error: &ValidationError) -> Self {
        Self::Error {
            error: error.to_string(),
        }
    }

    /// Returns true for error answers.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

/// Writes responses as newline-terminated JSON lines.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps an output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `response` followed by a newline and flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization, writing or flushing fails.
    pub fn write_response(&mut self, response: &BridgeResponse) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

//! Error types for rejected requests.
//!
//! The display text of each variant is the exact `error` string sent back to
//! the client, so editors can match on it.

use thiserror::Error;

/// Reasons a request is answered with an error response.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Frame is not JSON, or a snippet field holds a non-string value.
    #[error("invalid JSON")]
    MalformedPayload {
        /// Parser diagnostics.
        #[source]
        source: serde_json::Error,
    },

    /// A non-health request lacks a non-empty `text` field.
    #[error("missing 'text'")]
    MissingText,

    /// The `type` field names no known request kind.
    #[error("unknown type")]
    UnknownKind {
        /// Raw `type` value, absent when the field was omitted.
        kind: Option<String>,
    },
}

impl ValidationError {
    /// Creates a malformed payload error from a parser failure.
    #[must_use]
    pub const fn malformed(source: serde_json::Error) -> Self {
        Self::MalformedPayload { source }
    }

    /// Creates an unknown kind error.
    #[must_use]
    pub const fn unknown_kind(kind: Option<String>) -> Self {
        Self::UnknownKind { kind }
    }
}

//! Error types for the CLI runtime.

use std::io;

use thiserror::Error;

use pi_bridge_config::WorkingDirError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    WorkingDir(#[from] WorkingDirError),
    #[error("failed to read snippet from stdin: {0}")]
    ReadInput(io::Error),
    #[error("no bridge listening at {socket}: {source}")]
    Connect { socket: String, source: io::Error },
    #[error("failed to serialise request: {0}")]
    SerialiseRequest(serde_json::Error),
    #[error("failed to send request to bridge: {0}")]
    SendRequest(io::Error),
    #[error("failed to read response from bridge: {0}")]
    ReadResponse(io::Error),
    #[error("bridge closed the connection without responding")]
    MissingResponse,
    #[error("failed to parse bridge response: {0}")]
    ParseResponse(serde_json::Error),
    #[error("failed to write response: {0}")]
    ForwardResponse(io::Error),
}

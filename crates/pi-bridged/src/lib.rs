//! Unix-socket bridge that lets an editor push code into an agent session.
//!
//! A [`BridgeServer`] listens on a socket whose path is derived from the
//! session's working directory, so an editor opened in the same project finds
//! it without configuration. Each connection sends one JSON request line and
//! receives one JSON response line:
//!
//! - `health` reports the session's working directory.
//! - `context` renders the snippet as a fenced code block and queues it for
//!   the next turn.
//! - `prompt` prepends an instruction to the block and queues it as a
//!   follow-up user message.
//!
//! The embedding session implements [`Host`]. The `pi-bridged` binary ships a
//! standalone host, [`EventStreamHost`], that writes host events to stdout as
//! JSON lines.

mod dispatch;
mod event_host;
mod host;
mod process;
mod server;
mod telemetry;
mod transport;

pub use dispatch::{
    BridgeConnectionHandler, BridgeResponse, Message, ResponseWriter, Snippet, ValidationError,
    dispatch, validate,
};
pub use event_host::{BridgeEvent, EventStreamError, EventStreamHost};
pub use host::{Host, NotifyLevel};
pub use process::{
    LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_bridge, run_with,
};
pub use server::{BridgeServer, STATUS_KEY, STATUS_TEXT, StartError};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
pub use transport::{FrameDecoder, FrameTooLarge, Frames, ListenerError, RawFrame};

#[cfg(test)]
mod tests;

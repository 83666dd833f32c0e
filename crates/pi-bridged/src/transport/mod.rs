//! Unix socket transport for the bridge.
//!
//! The listener binds the derived socket path, polls for connections on a
//! background thread and hands each accepted stream to a
//! [`ConnectionHandler`] on its own thread. The [`FrameDecoder`] turns the
//! bytes read from a stream into newline-delimited frames.

mod errors;
mod frame;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub use self::errors::ListenerError;
pub use self::frame::{FrameDecoder, FrameTooLarge, Frames, RawFrame};
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream, read_chunk};
pub(crate) use self::listener::{ListenerHandle, SocketListener, cleanup_unix_socket};
#[cfg(test)]
pub(crate) use self::test_utils::FirstFrameRecorder;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

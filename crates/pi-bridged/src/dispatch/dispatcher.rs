//! Maps validated requests onto host side effects.

use tracing::debug;

use crate::host::{Host, NotifyLevel};

use super::errors::ValidationError;
use super::request::Message;
use super::response::BridgeResponse;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Executes `message` against `host` and returns the response to send.
///
/// Context and prompt requests each hand one message to the host and raise
/// one info notification; health and unknown requests leave the host alone.
pub fn dispatch<H>(message: Message, host: &H) -> BridgeResponse
where
    H: Host + ?Sized,
{
    debug!(target: DISPATCH_TARGET, kind = message.kind(), "dispatching request");
    match message {
        Message::Health => BridgeResponse::health(host.working_directory()),
        Message::Context(snippet) => {
            let lines = snippet.line_count();
            host.inject_context(snippet.render());
            host.notify(&format!("nvim: received {lines} lines"), NotifyLevel::Info);
            BridgeResponse::ok()
        }
        Message::Prompt {
            instruction,
            snippet,
        } => {
            let lines = snippet.line_count();
            host.inject_follow_up(snippet.render_with_instruction(instruction.as_deref()));
            host.notify(
                &format!("nvim: prompting with {lines} lines"),
                NotifyLevel::Info,
            );
            BridgeResponse::ok()
        }
        Message::Unknown { kind } => {
            BridgeResponse::from_error(&ValidationError::unknown_kind(kind))
        }
    }
}

//! Interface to the host session the bridge injects into.
//!
//! The bridge never owns the host's UI or its message queue. Everything it
//! needs is reached through [`Host`], which the embedding session implements
//! and hands to [`BridgeServer`](crate::BridgeServer) at construction.
//! Implementations must return promptly: connection handlers call these
//! methods inline and never wait for the host to act on them.

use std::sync::Arc;

use serde::Serialize;
use strum::Display;

/// Severity of a UI notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotifyLevel {
    /// Informational message.
    Info,
    /// Error report.
    Error,
}

/// Collaborator interface implemented by the host session.
#[cfg_attr(test, mockall::automock)]
pub trait Host: Send + Sync + 'static {
    /// Shows a transient notification in the host UI.
    fn notify(&self, message: &str, level: NotifyLevel);

    /// Registers or replaces a persistent status indicator.
    fn set_status(&self, key: &str, text: &str);

    /// Queues content for delivery at the start of the host's next turn.
    fn inject_context(&self, content: String);

    /// Queues content as a user message sent after the current turn.
    fn inject_follow_up(&self, content: String);

    /// Working-directory identity of the session.
    fn working_directory(&self) -> String;
}

impl<T> Host for Arc<T>
where
    T: Host + ?Sized,
{
    fn notify(&self, message: &str, level: NotifyLevel) {
        (**self).notify(message, level);
    }

    fn set_status(&self, key: &str, text: &str) {
        (**self).set_status(key, text);
    }

    fn inject_context(&self, content: String) {
        (**self).inject_context(content);
    }

    fn inject_follow_up(&self, content: String) {
        (**self).inject_follow_up(content);
    }

    fn working_directory(&self) -> String {
        (**self).working_directory()
    }
}

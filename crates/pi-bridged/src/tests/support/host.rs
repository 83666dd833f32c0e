//! Test double for [`Host`] that records every side effect for assertions.

use std::sync::Mutex;

use crate::host::{Host, NotifyLevel};

/// Side effects observed by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    /// Content queued for the next turn.
    Context(String),
    /// Content queued as a follow-up user message.
    FollowUp(String),
    /// UI notification.
    Notify { message: String, level: NotifyLevel },
    /// Status indicator update.
    Status { key: String, text: String },
}

/// Records host interactions in call order.
#[derive(Debug)]
pub struct RecordingHost {
    working_directory: String,
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingHost {
    /// Builds a host reporting `working_directory` as its identity.
    pub fn new(working_directory: impl Into<String>) -> Self {
        Self {
            working_directory: working_directory.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .expect("host events mutex poisoned")
            .clone()
    }

    /// Context blocks queued for the next turn.
    #[must_use]
    pub fn injected_context(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::Context(content) => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Follow-up messages queued after the current turn.
    #[must_use]
    pub fn follow_ups(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::FollowUp(content) => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Notifications raised so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<(String, NotifyLevel)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::Notify { message, level } => Some((message, level)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: RecordedEvent) {
        self.events
            .lock()
            .expect("host events mutex poisoned")
            .push(event);
    }
}

impl Host for RecordingHost {
    fn notify(&self, message: &str, level: NotifyLevel) {
        self.record(RecordedEvent::Notify {
            message: message.to_owned(),
            level,
        });
    }

    fn set_status(&self, key: &str, text: &str) {
        self.record(RecordedEvent::Status {
            key: key.to_owned(),
            text: text.to_owned(),
        });
    }

    fn inject_context(&self, content: String) {
        self.record(RecordedEvent::Context(content));
    }

    fn inject_follow_up(&self, content: String) {
        self.record(RecordedEvent::FollowUp(content));
    }

    fn working_directory(&self) -> String {
        self.working_directory.clone()
    }
}

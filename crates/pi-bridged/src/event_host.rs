//! Host that reports bridge activity as JSON lines on a stream.
//!
//! The standalone `pi-bridged` binary has no agent session to inject into.
//! It publishes every host side effect as one JSON object per line so a
//! supervising process can read them from stdout. Events are handed to a
//! writer thread over a channel, keeping connection handlers off the output
//! stream.

use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use serde::Serialize;
use tracing::warn;

use crate::host::{Host, NotifyLevel};

const EVENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::events");

/// One host side effect, serialized with an `event` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Content queued for the next turn.
    Context {
        /// Rendered code block.
        content: String,
    },
    /// Content queued as a follow-up user message.
    FollowUp {
        /// Rendered prompt and code block.
        content: String,
    },
    /// UI notification.
    Notify {
        /// Notification text.
        message: String,
        /// Severity.
        level: NotifyLevel,
    },
    /// Status indicator update.
    Status {
        /// Indicator key.
        key: String,
        /// Indicator text.
        text: String,
    },
}

/// Errors raised when the event stream is closed.
#[derive(Debug, thiserror::Error)]
pub enum EventStreamError {
    /// Writing an event failed.
    #[error("failed to write bridge event: {0}")]
    Write(#[from] io::Error),
    /// The writer thread panicked.
    #[error("bridge event writer panicked")]
    WriterPanic,
}

/// [`Host`] implementation that streams events to a writer.
#[derive(Debug)]
pub struct EventStreamHost {
    working_directory: String,
    sender: Mutex<Option<Sender<BridgeEvent>>>,
    writer: Mutex<Option<JoinHandle<io::Result<()>>>>,
}

impl EventStreamHost {
    /// Spawns the writer thread and returns the host feeding it.
    pub fn spawn<W>(working_directory: impl Into<String>, output: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let writer = thread::spawn(move || write_events(receiver, output));
        Self {
            working_directory: working_directory.into(),
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(writer)),
        }
    }

    /// Stops accepting events and waits for queued ones to be written.
    ///
    /// Events emitted afterwards are dropped. Calling this twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`EventStreamError`] if the writer failed or panicked.
    pub fn finish(&self) -> Result<(), EventStreamError> {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        let writer = match self.writer.lock() {
            Ok(mut writer) => writer.take(),
            Err(_) => None,
        };
        match writer {
            Some(handle) => handle
                .join()
                .map_err(|_| EventStreamError::WriterPanic)?
                .map_err(EventStreamError::from),
            None => Ok(()),
        }
    }

    fn emit(&self, event: BridgeEvent) {
        let Ok(sender) = self.sender.lock() else {
            return;
        };
        let Some(sender) = sender.as_ref() else {
            warn!(target: EVENT_TARGET, ?event, "event stream closed; dropping event");
            return;
        };
        if sender.send(event).is_err() {
            warn!(target: EVENT_TARGET, "event writer stopped; dropping event");
        }
    }
}

impl Host for EventStreamHost {
    fn notify(&self, message: &str, level: NotifyLevel) {
        self.emit(BridgeEvent::Notify {
            message: message.to_owned(),
            level,
        });
    }

    fn set_status(&self, key: &str, text: &str) {
        self.emit(BridgeEvent::Status {
            key: key.to_owned(),
            text: text.to_owned(),
        });
    }

    fn inject_context(&self, content: String) {
        self.emit(BridgeEvent::Context { content });
    }

    fn inject_follow_up(&self, content: String) {
        self.emit(BridgeEvent::FollowUp { content });
    }

    fn working_directory(&self) -> String {
        self.working_directory.clone()
    }
}

fn write_events<W: Write>(receiver: Receiver<BridgeEvent>, mut output: W) -> io::Result<()> {
    for event in receiver {
        serde_json::to_writer(&mut output, &event)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }
    Ok(())
}

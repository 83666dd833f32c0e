//! Shared test doubles for the bridge behavioural suites.

mod host;
mod session;

pub use host::{RecordedEvent, RecordingHost};
pub use session::{TestSession, connect_and_send};

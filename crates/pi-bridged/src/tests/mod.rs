//! Test suites for the bridge daemon.

mod server_behaviour;
pub(crate) mod support;

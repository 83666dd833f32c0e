//! Behavioural tests for the bridge session lifecycle.

use std::cell::RefCell;
use std::os::unix::net::UnixListener;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use pi_bridge_config::SocketAddress;

use crate::host::NotifyLevel;
use crate::server::StartError;

use super::support::{RecordedEvent, TestSession, connect_and_send};

struct LifecycleWorld {
    session: Option<TestSession>,
    rival: Option<TestSession>,
    address: Option<SocketAddress>,
    start_error: Option<StartError>,
}

impl LifecycleWorld {
    fn new() -> Self {
        Self {
            session: None,
            rival: None,
            address: None,
            start_error: None,
        }
    }

    fn session(&self) -> &TestSession {
        self.session.as_ref().expect("session should be configured")
    }

    fn session_mut(&mut self) -> &mut TestSession {
        self.session.as_mut().expect("session should be configured")
    }

    fn derived_address(&self) -> SocketAddress {
        self.session().expected_address()
    }
}

#[fixture]
fn world() -> RefCell<LifecycleWorld> {
    RefCell::new(LifecycleWorld::new())
}

#[given(r#"a bridge session for "{cwd}""#)]
fn given_session(world: &RefCell<LifecycleWorld>, cwd: String) {
    world.borrow_mut().session = Some(TestSession::new(strip_quotes(&cwd)));
}

#[given("a stale socket exists at the derived path")]
fn given_stale_socket(world: &RefCell<LifecycleWorld>) {
    let address = world.borrow().derived_address();
    let listener = UnixListener::bind(address.as_std_path()).expect("bind stale socket");
    drop(listener);
    assert!(address.as_std_path().exists(), "stale socket file should remain");
}

#[given("another bridge already serves the same directory")]
fn given_rival_bridge(world: &RefCell<LifecycleWorld>) {
    let mut world = world.borrow_mut();
    let session = world.session();
    let expected = session.expected_address();
    let mut rival = TestSession::sharing_directory_with(session);
    let address = rival.start().expect("start rival bridge");
    assert_eq!(address, expected);
    world.rival = Some(rival);
}

#[when("the session starts")]
fn when_session_starts(world: &RefCell<LifecycleWorld>) {
    let mut world = world.borrow_mut();
    let outcome = world.session_mut().start();
    match outcome {
        Ok(address) => world.address = Some(address),
        Err(error) => world.start_error = Some(error),
    }
}

#[when("the session shuts down")]
fn when_session_shuts_down(world: &RefCell<LifecycleWorld>) {
    world.borrow_mut().session_mut().server.on_session_shutdown();
}

#[then("the session is accepting")]
fn then_accepting(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    assert!(
        world.session().server.is_accepting(),
        "expected the bridge to accept, start error: {:?}",
        world.start_error
    );
}

#[then("the session is not accepting")]
fn then_not_accepting(world: &RefCell<LifecycleWorld>) {
    assert!(!world.borrow().session().server.is_accepting());
}

#[then("the socket file exists")]
fn then_socket_exists(world: &RefCell<LifecycleWorld>) {
    assert!(world.borrow().derived_address().as_std_path().exists());
}

#[then("the socket file is gone")]
fn then_socket_gone(world: &RefCell<LifecycleWorld>) {
    assert!(!world.borrow().derived_address().as_std_path().exists());
}

#[then("the host was notified of the socket address")]
fn then_notified_address(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    let address = world.address.as_ref().expect("session should have started");
    assert_eq!(address, &world.derived_address());
    let expected = format!("nvim bridge: {address}");
    assert!(
        world
            .session()
            .host
            .notifications()
            .contains(&(expected.clone(), NotifyLevel::Info)),
        "expected notification {expected:?}, got {:?}",
        world.session().host.events()
    );
}

#[then(r#"the status "{key}" shows "{text}""#)]
fn then_status(world: &RefCell<LifecycleWorld>, key: String, text: String) {
    let expected = RecordedEvent::Status {
        key: strip_quotes(&key).to_owned(),
        text: strip_quotes(&text).to_owned(),
    };
    assert!(world.borrow().session().host.events().contains(&expected));
}

#[then(r#"a health request reports "{cwd}""#)]
fn then_health_reports(world: &RefCell<LifecycleWorld>, cwd: String) {
    let address = world.borrow().derived_address();
    let lines = connect_and_send(&address, b"{\"type\":\"health\"}\n");
    let expected = format!(r#"{{"status":"ok","cwd":"{}"}}"#, strip_quotes(&cwd));
    assert_eq!(lines, vec![expected]);
}

#[then("the host was notified of an error")]
fn then_notified_error(world: &RefCell<LifecycleWorld>) {
    let world = world.borrow();
    let notifications = world.session().host.notifications();
    assert!(
        notifications
            .iter()
            .any(|(message, level)| *level == NotifyLevel::Error
                && message.starts_with("nvim bridge error: ")),
        "expected an error notification, got {notifications:?}"
    );
    assert!(
        !world
            .session()
            .host
            .events()
            .iter()
            .any(|event| matches!(event, RecordedEvent::Status { .. })),
        "status should not be set when start fails"
    );
}

#[then("the other bridge still answers health requests")]
fn then_rival_answers(world: &RefCell<LifecycleWorld>) {
    let address = world.borrow().derived_address();
    let lines = connect_and_send(&address, b"{\"type\":\"health\"}\n");
    assert_eq!(lines.len(), 1, "expected one response, got {lines:?}");
    assert!(lines[0].contains(r#""status":"ok""#));
}

/// Strips surrounding double quotes from a string if present.
fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}

#[scenario(
    path = "tests/features/bridge_lifecycle.feature",
    name = "Starting a session announces the socket"
)]
fn session_start_announces_socket(world: RefCell<LifecycleWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/bridge_lifecycle.feature",
    name = "A stale socket left by a crashed session is replaced"
)]
fn stale_socket_is_replaced(world: RefCell<LifecycleWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/bridge_lifecycle.feature",
    name = "A live bridge for the same directory is left alone"
)]
fn live_bridge_is_left_alone(world: RefCell<LifecycleWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/bridge_lifecycle.feature",
    name = "Shutting down twice is harmless"
)]
fn shutdown_is_idempotent(world: RefCell<LifecycleWorld>) {
    drop(world);
}

//! Shared helpers for tests.

use axum_test::TestServer;
use rusqlite::Connection;

use crate::{AppState, build_router};

/// Create app state backed by a fresh in-memory database, using UTC as the local timezone.
pub fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "Etc/UTC").expect("Could not create app state")
}

/// Serve the full app router for `state`.
pub fn get_test_server(state: AppState) -> TestServer {
    TestServer::try_new(build_router(state)).expect("Could not create test server.")
}

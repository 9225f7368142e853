//! Global subscriber installation
//!
//! Runs in its own process, so the global subscriber starts unset.

use keyserver_log::{Config, LogError, init};

#[test]
fn second_init_fails() {
    init(Config::production()).unwrap();
    tracing::info!(version = 1, "logger installed");

    let err = init(Config::development()).unwrap_err();
    assert!(matches!(err, LogError::Init(_)));
}

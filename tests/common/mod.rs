//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use meetgraph_core::{domain, store::Store, GraphConfig};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// An empty store over the meeting relation table, cross-checking its index on every commit.
#[allow(dead_code)]
pub fn verified_store() -> Store {
    let config = GraphConfig {
        verify_index: true,
        ..GraphConfig::default()
    };
    domain::new_store(&config).unwrap()
}

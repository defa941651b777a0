//! SSO Testing Infrastructure
//!
//! Shared helpers for session engine tests: proptest strategies for the
//! policy model, hand-built fixtures, and a simulator that replays spend
//! attempts against a spec the way the on-chain validator would.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! sso-testkit = { path = "../sso-testkit" }
//! ```
//!
//! ```rust,no_run
//! use sso_testkit::*;
//!
//! #[test]
//! fn my_test() {
//!     init_test_tracing();
//!     let spec = SessionSpecBuilder::new(sample_signer()).expires_at(1_000).build();
//!     let state = fresh_state(&spec);
//!     // ... test logic
//! }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod fixtures;
pub mod simulator;
pub mod strategies;

pub use fixtures::*;
pub use simulator::{SessionSimulator, SpendAttempt};

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a test-friendly `tracing` subscriber once per process.
///
/// Honors `RUST_LOG`; defaults to `warn` so saturation and overflow
/// diagnostics show up in failing test output.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

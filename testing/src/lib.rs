//! # Pantry Testing
//!
//! Testing utilities and helpers for the Pantry architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits ([`MockHttpClient`])
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for effects
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use pantry_testing::{MockHttpClient, helpers};
//!
//! #[tokio::test]
//! async fn test_add_flow() {
//!     helpers::init_test_tracing();
//!     let client = MockHttpClient::new();
//!     client.respond_with(json!({"name": "xyz123"}));
//!
//!     let dispatcher = RequestDispatcher::<PendingChange>::new(Arc::new(client.clone()));
//!     let mut ticket = dispatcher.send(url, Method::Post, body, None, Some("ADD"))?;
//!     ticket.wait().await;
//!
//!     assert!(dispatcher.snapshot().data().is_some());
//! }
//! ```

/// Mock implementations of Environment traits
pub mod mocks;


/// Test helpers and utilities
pub mod helpers {
    use std::sync::Once;

    static INIT: Once = Once::new();

    /// Install a `tracing` subscriber for tests
    ///
    /// Honors `RUST_LOG`, writes through the test harness's captured output
    /// and is safe to call from every test.
    pub fn init_test_tracing() {
        INIT.call_once(|| {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
                )
                .with_test_writer()
                .try_init();
        });
    }
}

// Re-export commonly used items
pub use mocks::{MockHttpClient, ResponseGate};
pub use reducer_test::{assertions, ReducerTest};

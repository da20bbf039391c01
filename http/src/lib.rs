//! # Pantry HTTP
//!
//! The request lifecycle: a small store that tracks one HTTP request at a
//! time and lets callers correlate its outcome with the operation that
//! started it.
//!
//! ## Components
//!
//! - [`RequestState`]: Idle / Loading / Succeeded / Failed, plus the last
//!   payload, error, correlation payload ("extra") and identifier
//! - [`RequestAction`] and [`RequestReducer`]: the four transitions
//! - [`RequestDispatcher`]: `send`, `reset`, `snapshot`, `subscribe`
//! - [`RequestTicket`]: wait for or cancel one request
//! - [`ReqwestClient`]: the production [`HttpClient`](pantry_core::environment::HttpClient)
//!
//! ## Example
//!
//! ```ignore
//! use pantry_http::{RequestDispatcher, ReqwestClient};
//! use pantry_core::http::Method;
//!
//! let dispatcher = RequestDispatcher::<String>::new(Arc::new(ReqwestClient::new()?));
//! let mut ticket = dispatcher.send(url, Method::Get, None, None, Some("SEARCH"))?;
//! assert!(dispatcher.snapshot().is_loading());
//!
//! ticket.wait().await;
//! println!("{:?}", dispatcher.snapshot().data());
//! ```
//!
//! Every failure is reported as [`GENERIC_FAILURE`]. The cause is logged
//! with `tracing` at warn level.

/// Request lifecycle actions
pub mod action;

/// Reqwest-backed client
pub mod client;

/// Caller-facing dispatcher and tickets
pub mod dispatcher;

/// The lifecycle reducer
pub mod reducer;

/// Request lifecycle state
pub mod state;

pub use action::{RequestAction, RequestActionKind, SupersedePolicy, UnknownTransition};
pub use client::{ClientConfig, ReqwestClient};
pub use dispatcher::{DispatchError, RequestBody, RequestDispatcher, RequestTicket};
pub use reducer::{RequestEnvironment, RequestReducer, GENERIC_FAILURE};
pub use state::{RequestId, RequestState, RequestStatus};

// The vocabulary callers need alongside the dispatcher
pub use pantry_core::http::{HttpRequest, Method};
pub use pantry_runtime::SubscriptionId;

//! HTTP request vocabulary shared by reducers and their environments.
//!
//! Reducers never talk to the network directly. They describe a request as an
//! [`HttpRequest`] and hand it to the [`HttpClient`] from their environment
//! inside an effect. The production client (reqwest) lives in `pantry-http`;
//! a scripted mock lives in `pantry-testing`.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP verb for a request.
///
/// The remote document store only needs GET, POST and DELETE. Any other verb
/// can still be expressed through [`Method::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// Read a resource or collection
    Get,
    /// Create a resource in a collection
    Post,
    /// Delete a resource
    Delete,
    /// Any other verb, passed through verbatim
    Other(String),
}

impl Method {
    /// The verb as it appears on the wire
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Other(verb) => verb,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Method {
    fn from(verb: &str) -> Self {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A request to send to the remote document store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// HTTP verb
    pub method: Method,
    /// Absolute URL of the target resource
    pub url: String,
    /// Already-serialized JSON body, if any
    pub body: Option<String>,
}

impl HttpRequest {
    /// Create a request without a body
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
        }
    }

    /// Attach a serialized body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Errors that can occur while executing an [`HttpRequest`].
///
/// These are kept apart for logging. The request lifecycle surfaces every one
/// of them to the user as the same generic failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The request could not be built (bad verb, bad URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Connection, DNS or TLS failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete in time
    #[error("Request timed out")]
    Timeout,

    /// The server answered with a non-success status
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The response body was not valid JSON
    #[error("Response decoding failed: {0}")]
    Decode(String),
}

/// HTTP client dependency.
///
/// Executes a request and parses the response body as JSON.
///
/// # Dyn Compatibility
///
/// This trait returns a boxed future instead of using `async fn` so that it
/// can be stored as `Arc<dyn HttpClient>` inside environments.
///
/// The returned future owns everything it needs (`'static`), so a reducer can
/// call `execute` while reducing and move the future into an effect. Requests
/// are therefore handed to the client in the order actions are reduced.
pub trait HttpClient: Send + Sync {
    /// Execute a request and return the decoded JSON body.
    ///
    /// Any non-2xx status is an error.
    ///
    /// # Errors
    ///
    /// The future resolves to an [`HttpError`] describing why the request failed.
    fn execute(&self, request: HttpRequest) -> BoxFuture<'static, Result<serde_json::Value, HttpError>>;
}

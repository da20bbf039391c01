//! Mock implementations of Environment traits
//!
//! [`MockHttpClient`] replaces the network in reducer and dispatcher tests.
//! Responses are scripted ahead of time and handed out in the order requests
//! arrive. A response can also be left open with [`MockHttpClient::gate`] and
//! resolved later, which is how tests control the order in which concurrent
//! requests complete.

use futures::future::BoxFuture;
use futures::FutureExt;
use pantry_core::http::{HttpClient, HttpError, HttpRequest};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

type Outcome = Result<Value, HttpError>;

enum Scripted {
    Ready(Outcome),
    Gated(oneshot::Receiver<Outcome>),
}

#[derive(Default)]
struct MockState {
    requests: Vec<HttpRequest>,
    responses: VecDeque<Scripted>,
}

/// Scripted HTTP client for tests
///
/// # Example
///
/// ```ignore
/// let client = MockHttpClient::new();
/// client.respond_with(json!({"name": "xyz123"}));
/// let gate = client.gate();
///
/// // first request resolves immediately, second waits for the gate
/// gate.succeed(json!(null));
/// ```
///
/// A request with nothing scripted fails with [`HttpError::Transport`].
#[derive(Clone, Default)]
pub struct MockHttpClient {
    inner: Arc<Mutex<MockState>>,
}

impl MockHttpClient {
    /// Create a client with no scripted responses
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a successful JSON response
    pub fn respond_with(&self, payload: Value) -> &Self {
        self.lock()
            .responses
            .push_back(Scripted::Ready(Ok(payload)));
        self
    }

    /// Queue a failed response
    pub fn fail_with(&self, error: HttpError) -> &Self {
        self.lock()
            .responses
            .push_back(Scripted::Ready(Err(error)));
        self
    }

    /// Queue a response that stays pending until the returned gate is resolved
    ///
    /// Dropping the gate without resolving it fails the request.
    #[must_use]
    pub fn gate(&self) -> ResponseGate {
        let (sender, receiver) = oneshot::channel();
        self.lock().responses.push_back(Scripted::Gated(receiver));
        ResponseGate { sender }
    }

    /// Every request executed so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests executed so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Number of scripted responses not yet consumed
    #[must_use]
    pub fn remaining_responses(&self) -> usize {
        self.lock().responses.len()
    }
}

impl HttpClient for MockHttpClient {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'static, Result<Value, HttpError>> {
        let scripted = {
            let mut state = self.lock();
            state.requests.push(request);
            state.responses.pop_front()
        };

        match scripted {
            Some(Scripted::Ready(outcome)) => futures::future::ready(outcome).boxed(),
            Some(Scripted::Gated(receiver)) => async move {
                receiver.await.unwrap_or_else(|_| {
                    Err(HttpError::Transport("response gate dropped".to_string()))
                })
            }
            .boxed(),
            None => futures::future::ready(Err(HttpError::Transport(
                "no scripted response".to_string(),
            )))
            .boxed(),
        }
    }
}

impl std::fmt::Debug for MockHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockHttpClient")
            .field("requests", &state.requests.len())
            .field("pending_responses", &state.responses.len())
            .finish()
    }
}

/// Handle for resolving a gated response
#[derive(Debug)]
pub struct ResponseGate {
    sender: oneshot::Sender<Outcome>,
}

impl ResponseGate {
    /// Resolve the gated request successfully
    pub fn succeed(self, payload: Value) {
        let _ = self.sender.send(Ok(payload));
    }

    /// Resolve the gated request with an error
    pub fn fail(self, error: HttpError) {
        let _ = self.sender.send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_core::http::Method;
    use serde_json::json;

    fn get(url: &str) -> HttpRequest {
        HttpRequest::new(Method::Get, url)
    }

    #[tokio::test]
    async fn hands_out_responses_in_order() {
        let client = MockHttpClient::new();
        client
            .respond_with(json!({"a": 1}))
            .fail_with(HttpError::Timeout);

        let first = client.execute(get("https://db.test/a.json"));
        let second = client.execute(get("https://db.test/b.json"));

        assert_eq!(first.await, Ok(json!({"a": 1})));
        assert_eq!(second.await, Err(HttpError::Timeout));
        assert_eq!(client.request_count(), 2);
        assert_eq!(client.requests()[1].url, "https://db.test/b.json");
    }

    #[tokio::test]
    async fn unscripted_request_fails() {
        let client = MockHttpClient::new();
        let result = client.execute(get("https://db.test/a.json")).await;
        assert!(matches!(result, Err(HttpError::Transport(_))));
    }

    #[tokio::test]
    async fn gated_response_waits_for_gate() {
        let client = MockHttpClient::new();
        let gate = client.gate();

        let pending = tokio::spawn(client.execute(get("https://db.test/a.json")));
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.succeed(json!(null));
        let result = pending.await;
        assert!(matches!(result, Ok(Ok(Value::Null))));
    }

    #[tokio::test]
    async fn dropped_gate_fails_request() {
        let client = MockHttpClient::new();
        drop(client.gate());

        let result = client.execute(get("https://db.test/a.json")).await;
        assert!(matches!(result, Err(HttpError::Transport(_))));
        assert_eq!(client.remaining_responses(), 0);
    }
}

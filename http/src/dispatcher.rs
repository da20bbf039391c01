//! Caller-facing surface of the request lifecycle.

use crate::action::{RequestAction, SupersedePolicy};
use crate::reducer::{RequestEnvironment, RequestReducer};
use crate::state::{RequestId, RequestState};
use pantry_core::cancellation::CancellationToken;
use pantry_core::environment::HttpClient;
use pantry_core::http::{HttpRequest, Method};
use pantry_runtime::{EffectHandle, Store, StoreError, SubscriptionId};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

type RequestStore<X> = Store<RequestState<X>, RequestAction<X>, RequestEnvironment, RequestReducer<X>>;

/// Errors returned by [`RequestDispatcher`]
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The target is not a valid absolute URL
    #[error("Invalid request target {target:?}: {reason}")]
    InvalidTarget {
        /// The rejected target
        target: String,
        /// Why it was rejected
        reason: String,
    },

    /// A request body could not be serialized
    #[error("Failed to serialize request body: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The underlying store rejected the action
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A serialized JSON request body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestBody(String);

impl RequestBody {
    /// Serialize `value` as JSON
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Serialize`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, DispatchError> {
        Ok(Self(serde_json::to_string(value)?))
    }

    /// The serialized body
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<RequestBody> for String {
    fn from(body: RequestBody) -> Self {
        body.0
    }
}

/// Handle to one sent request
///
/// Dropping a ticket does not cancel the request.
#[derive(Debug)]
pub struct RequestTicket {
    id: RequestId,
    token: CancellationToken,
    handle: EffectHandle,
}

impl RequestTicket {
    /// Id of the request
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Abandon the request
    ///
    /// Its resolution will never be applied to the state.
    pub fn cancel(&self) {
        tracing::debug!(request_id = %self.id, "Request ticket cancelled");
        self.token.cancel();
    }

    /// Whether the request was cancelled, by this ticket or by a newer send
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until the request has resolved (or been dropped after cancellation)
    ///
    /// When this returns, the resolution is already reflected in the state.
    pub async fn wait(&mut self) {
        self.handle.wait().await;
    }

    /// Wait with a timeout
    ///
    /// # Errors
    ///
    /// Returns `Err(())` if the request is still pending when the timeout expires.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), ()> {
        self.handle.wait_with_timeout(timeout).await
    }
}

/// Issues requests and tracks their lifecycle in a [`RequestState`].
///
/// # Example
///
/// ```ignore
/// let dispatcher = RequestDispatcher::<PendingChange>::new(client);
/// dispatcher.subscribe(|state| {
///     if let Some(error) = state.error() {
///         println!("{error}");
///     }
/// });
///
/// let body = RequestBody::json(&new_ingredient)?;
/// dispatcher.send(
///     "https://db.example.com/ingredients.json",
///     Method::Post,
///     Some(body.into()),
///     Some(PendingChange::Add(new_ingredient)),
///     Some("ADD_INGREDIENT"),
/// )?;
/// ```
///
/// Clones share the same state, subscribers and in-flight requests.
pub struct RequestDispatcher<X>
where
    X: Clone + Send + Sync + 'static,
{
    store: RequestStore<X>,
    next_id: Arc<AtomicU64>,
    policy: SupersedePolicy,
}

impl<X> RequestDispatcher<X>
where
    X: Clone + Send + Sync + 'static,
{
    /// Create a dispatcher in the Idle state
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            store: Store::new(
                RequestState::idle(),
                RequestReducer::new(),
                RequestEnvironment::new(client),
            ),
            next_id: Arc::new(AtomicU64::new(1)),
            policy: SupersedePolicy::default(),
        }
    }

    /// Set the supersede policy
    #[must_use]
    pub const fn with_policy(mut self, policy: SupersedePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The supersede policy in effect
    #[must_use]
    pub const fn policy(&self) -> SupersedePolicy {
        self.policy
    }

    /// Send a request
    ///
    /// The state is Loading when this returns; the network call runs in the
    /// background and its outcome is applied when it resolves. Under
    /// [`SupersedePolicy::LatestRequestWins`] the previous request is
    /// cancelled in the same transition, so its result can no longer land.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidTarget`] if `target` is not an absolute URL;
    ///   no transition happens
    /// - [`DispatchError::Store`] if no tokio runtime is available or the
    ///   dispatcher is shutting down
    pub fn send(
        &self,
        target: &str,
        verb: Method,
        body: Option<String>,
        extra: Option<X>,
        identifier: Option<&str>,
    ) -> Result<RequestTicket, DispatchError> {
        let url = reqwest::Url::parse(target).map_err(|error| DispatchError::InvalidTarget {
            target: target.to_string(),
            reason: error.to_string(),
        })?;

        let request_id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = CancellationToken::new();

        let mut request = HttpRequest::new(verb, url.as_str());
        if let Some(body) = body {
            request = request.with_body(body);
        }

        metrics::counter!("http.requests.total", "method" => request.method.to_string())
            .increment(1);

        let handle = self.store.send(RequestAction::Send {
            request_id,
            request,
            extra,
            identifier: identifier.map(str::to_string),
            token: token.clone(),
            supersede: self.policy,
        })?;

        Ok(RequestTicket {
            id: request_id,
            token,
            handle,
        })
    }

    /// Return to the initial Idle snapshot
    ///
    /// Requests still in flight are not cancelled and apply their outcome
    /// when they resolve.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Store`] if the store rejects the action.
    pub fn reset(&self) -> Result<(), DispatchError> {
        self.store.send(RequestAction::Reset)?;
        Ok(())
    }

    /// Clone of the current state
    #[must_use]
    pub fn snapshot(&self) -> RequestState<X> {
        self.store.snapshot()
    }

    /// Read the current state through a closure
    pub fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&RequestState<X>) -> T,
    {
        self.store.state(f)
    }

    /// Observe every transition
    ///
    /// The listener runs synchronously with the post-transition state. It
    /// must not call back into this dispatcher.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RequestState<X>) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Stop observing
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Number of requests whose outcome has not been applied or dropped yet
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.store.pending_effects()
    }

    /// Stop accepting requests and wait for in-flight ones
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if requests are still pending
    /// when the timeout expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

impl<X> Clone for RequestDispatcher<X>
where
    X: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            next_id: Arc::clone(&self.next_id),
            policy: self.policy,
        }
    }
}

impl<X> std::fmt::Debug for RequestDispatcher<X>
where
    X: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("policy", &self.policy)
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_testing::MockHttpClient;
    use serde_json::json;

    fn dispatcher(client: &MockHttpClient) -> RequestDispatcher<String> {
        RequestDispatcher::new(Arc::new(client.clone()))
    }

    #[tokio::test]
    async fn invalid_target_is_rejected_without_transition() {
        let client = MockHttpClient::new();
        let dispatcher = dispatcher(&client);

        let result = dispatcher.send("not a url", Method::Get, None, None, Some("SEARCH"));

        assert!(matches!(result, Err(DispatchError::InvalidTarget { .. })));
        assert_eq!(dispatcher.snapshot(), RequestState::idle());
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn send_is_loading_before_it_returns() {
        let client = MockHttpClient::new();
        let _gate = client.gate();
        let dispatcher = dispatcher(&client);

        let ticket = dispatcher
            .send("https://db.test/ingredients.json", Method::Get, None, None, Some("SEARCH"))
            .map_err(|e| e.to_string());

        assert!(ticket.is_ok());
        assert!(dispatcher.snapshot().is_loading());
        assert_eq!(dispatcher.snapshot().identifier(), Some("SEARCH"));
    }

    #[tokio::test]
    async fn body_and_verb_reach_the_client() {
        let client = MockHttpClient::new();
        client.respond_with(json!({"name": "abc"}));
        let dispatcher = dispatcher(&client);

        let body = RequestBody::json(&json!({"title": "Sugar", "amount": "2"}));
        assert!(body.is_ok());
        let sent = dispatcher.send(
            "https://db.test/ingredients.json",
            Method::Post,
            body.ok().map(String::from),
            None,
            None,
        );
        let Ok(mut ticket) = sent else {
            unreachable!("valid target");
        };
        ticket.wait().await;

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(
            requests[0].body.as_deref(),
            Some(r#"{"amount":"2","title":"Sugar"}"#)
        );
    }

    #[tokio::test]
    async fn request_ids_increase_across_clones() {
        let client = MockHttpClient::new();
        client.respond_with(json!(null)).respond_with(json!(null));
        let first = dispatcher(&client);
        let second = first.clone();

        let a = first.send("https://db.test/a.json", Method::Get, None, None, None);
        let b = second.send("https://db.test/b.json", Method::Get, None, None, None);

        let (Ok(a), Ok(b)) = (a, b) else {
            unreachable!("valid targets");
        };
        assert!(a.id() < b.id());
        assert_eq!(first.snapshot().issued(), Some(b.id()));
    }

    #[test]
    fn send_outside_runtime_is_a_store_error() {
        let client = MockHttpClient::new();
        let dispatcher = dispatcher(&client);

        let result = dispatcher.send("https://db.test/a.json", Method::Get, None, None, None);

        assert!(matches!(result, Err(DispatchError::Store(StoreError::NoRuntime))));
    }
}

//! The request lifecycle reducer.

use crate::action::{RequestAction, SupersedePolicy};
use crate::state::{RequestState, RequestStatus};
use pantry_core::cancellation::CancellationToken;
use pantry_core::environment::HttpClient;
use pantry_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

/// The only failure message ever stored in [`RequestState`]
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Dependencies of [`RequestReducer`]
///
/// Clones share the token of the latest superseding request.
#[derive(Clone)]
pub struct RequestEnvironment {
    /// Executes requests
    pub client: Arc<dyn HttpClient>,
    latest: Arc<Mutex<Option<CancellationToken>>>,
}

impl RequestEnvironment {
    /// Create an environment around a client
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    /// Record `token` as the latest request and return the one it replaces
    fn supersede(&self, token: &CancellationToken) -> Option<CancellationToken> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone())
    }
}

impl std::fmt::Debug for RequestEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestEnvironment").finish_non_exhaustive()
    }
}

/// Reducer for [`RequestState`].
///
/// `Send` starts the network call as an [`Effect::Future`]. The future
/// resolves to `Succeed` or `Fail`, or to nothing if its token was cancelled
/// first. A `Succeed` or `Fail` whose token is cancelled when it reaches the
/// reducer changes nothing, so cancellation and supersession are decided
/// under the state lock. Every failure cause collapses to
/// [`GENERIC_FAILURE`]; the cause itself is only logged.
pub struct RequestReducer<X> {
    _extra: PhantomData<fn() -> X>,
}

impl<X> RequestReducer<X> {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _extra: PhantomData,
        }
    }
}

impl<X> Default for RequestReducer<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X> Clone for RequestReducer<X> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<X> std::fmt::Debug for RequestReducer<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RequestReducer")
    }
}

impl<X> Reducer for RequestReducer<X>
where
    X: Send + 'static,
{
    type State = RequestState<X>;
    type Action = RequestAction<X>;
    type Environment = RequestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let kind = action.kind();
        metrics::counter!("http.transitions.total", "kind" => kind.as_str()).increment(1);

        match action {
            RequestAction::Send {
                request_id,
                request,
                extra,
                identifier,
                token,
                supersede,
            } => {
                tracing::debug!(
                    %request_id,
                    method = %request.method,
                    url = %request.url,
                    identifier = identifier.as_deref().unwrap_or_default(),
                    %kind,
                    "Request sent"
                );

                if supersede == SupersedePolicy::LatestRequestWins {
                    if let Some(previous) = env.supersede(&token) {
                        tracing::debug!(%request_id, "Superseding previous request");
                        previous.cancel();
                    }
                }

                state.status = RequestStatus::Loading;
                state.error = None;
                state.data = None;
                state.extra = None;
                state.identifier = identifier;
                state.issued = Some(request_id);

                let method = request.method.clone();
                let url = request.url.clone();
                let response = env.client.execute(request);

                smallvec![Effect::Future(Box::pin(async move {
                    let outcome = tokio::select! {
                        biased;
                        () = token.cancelled() => None,
                        outcome = response => Some(outcome),
                    };

                    let Some(outcome) = outcome else {
                        tracing::debug!(%request_id, "Request cancelled, result dropped");
                        return None;
                    };

                    match outcome {
                        Ok(payload) => Some(RequestAction::Succeed {
                            request_id,
                            payload,
                            extra,
                            token,
                        }),
                        Err(error) => {
                            tracing::warn!(
                                %request_id,
                                %method,
                                %url,
                                error = %error,
                                "Request failed"
                            );
                            metrics::counter!("http.requests.failed").increment(1);
                            Some(RequestAction::Fail {
                                request_id,
                                message: GENERIC_FAILURE.to_string(),
                                token,
                            })
                        },
                    }
                }))]
            },

            RequestAction::Succeed { request_id, token, .. }
            | RequestAction::Fail { request_id, token, .. }
                if token.is_cancelled() =>
            {
                tracing::debug!(%request_id, %kind, "Request cancelled, result dropped");
                smallvec![Effect::None]
            },

            RequestAction::Succeed {
                request_id,
                payload,
                extra,
                ..
            } => {
                tracing::trace!(%request_id, %kind, "Request succeeded");
                state.status = RequestStatus::Succeeded;
                state.error = None;
                state.data = Some(payload);
                state.extra = extra;
                state.resolved = Some(request_id);
                smallvec![Effect::None]
            },

            RequestAction::Fail {
                request_id,
                message,
                ..
            } => {
                tracing::trace!(%request_id, %kind, "Request failed");
                state.status = RequestStatus::Failed;
                state.error = Some(message);
                state.data = None;
                state.extra = None;
                state.resolved = Some(request_id);
                smallvec![Effect::None]
            },

            RequestAction::Reset => {
                tracing::trace!(%kind, "Request state reset");
                *state = RequestState::idle();
                smallvec![Effect::None]
            },
        }
    }
}

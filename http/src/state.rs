//! Request lifecycle state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of one `send` on a dispatcher.
///
/// Ids increase monotonically per dispatcher, so a larger id was issued later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Where a request is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Nothing sent since creation or the last reset
    #[default]
    Idle,
    /// A request is in flight
    Loading,
    /// The last resolved request returned a JSON payload
    Succeeded,
    /// The last resolved request failed
    Failed,
}

/// Snapshot of the request lifecycle.
///
/// `X` is the caller's correlation payload ("extra"). It is stored when a
/// request succeeds and returned unchanged.
///
/// `data` and `error` are never both present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestState<X> {
    pub(crate) status: RequestStatus,
    pub(crate) error: Option<String>,
    pub(crate) data: Option<Value>,
    pub(crate) extra: Option<X>,
    pub(crate) identifier: Option<String>,
    pub(crate) issued: Option<RequestId>,
    pub(crate) resolved: Option<RequestId>,
}

impl<X> Default for RequestState<X> {
    fn default() -> Self {
        Self {
            status: RequestStatus::Idle,
            error: None,
            data: None,
            extra: None,
            identifier: None,
            issued: None,
            resolved: None,
        }
    }
}

impl<X> RequestState<X> {
    /// The initial Idle snapshot
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Current lifecycle status
    #[must_use]
    pub const fn status(&self) -> RequestStatus {
        self.status
    }

    /// Whether a request is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.status, RequestStatus::Loading)
    }

    /// Failure message of the last resolved request
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Payload of the last successful request
    ///
    /// A JSON `null` body is `Some(&Value::Null)`, distinct from "no payload".
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Correlation payload of the last successful request
    #[must_use]
    pub const fn extra(&self) -> Option<&X> {
        self.extra.as_ref()
    }

    /// Identifier of the most recently sent request
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Id of the most recently sent request
    #[must_use]
    pub const fn issued(&self) -> Option<RequestId> {
        self.issued
    }

    /// Id of the request whose outcome this snapshot reflects
    #[must_use]
    pub const fn resolved(&self) -> Option<RequestId> {
        self.resolved
    }

    /// Whether the outcome shown came from a request older than the latest one sent
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!((self.resolved, self.issued), (Some(resolved), Some(issued)) if resolved < issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_snapshot_is_empty() {
        let state = RequestState::<()>::idle();

        assert_eq!(state.status(), RequestStatus::Idle);
        assert!(!state.is_loading());
        assert!(state.error().is_none());
        assert!(state.data().is_none());
        assert!(state.extra().is_none());
        assert!(state.identifier().is_none());
        assert!(!state.is_stale());
    }

    #[test]
    fn stale_when_an_older_request_resolved_last() {
        let state = RequestState::<()> {
            status: RequestStatus::Succeeded,
            issued: Some(RequestId(2)),
            resolved: Some(RequestId(1)),
            ..RequestState::default()
        };
        assert!(state.is_stale());
    }

    #[test]
    fn request_id_display() {
        assert_eq!(RequestId(42).to_string(), "req-42");
    }
}

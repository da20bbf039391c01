//! Request lifecycle actions.

use crate::state::RequestId;
use pantry_core::cancellation::CancellationToken;
use pantry_core::http::HttpRequest;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// What happens to an in-flight request when a newer one is sent
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupersedePolicy {
    /// Every request applies its result when it resolves
    ///
    /// A slow earlier response can overwrite a later one.
    #[default]
    LastResolvedWins,
    /// Each send cancels the previous request, whose result is then dropped
    LatestRequestWins,
}

/// Every transition of a [`RequestState`](crate::RequestState).
///
/// The set is closed: there is no way to build an unrecognized transition.
#[derive(Clone, Debug)]
pub enum RequestAction<X> {
    /// A request was issued
    ///
    /// Moves to Loading, clears `data`, `error` and `extra`, and records the
    /// new `identifier`. The reducer starts the network call.
    Send {
        /// Id allocated by the dispatcher
        request_id: RequestId,
        /// What to execute
        request: HttpRequest,
        /// Correlation payload returned on success
        extra: Option<X>,
        /// Caller tag for this operation
        identifier: Option<String>,
        /// Cancelling it abandons the call and drops its result
        token: CancellationToken,
        /// Whether this send cancels the one before it
        supersede: SupersedePolicy,
    },

    /// The request returned a JSON payload
    ///
    /// Ignored if `token` was cancelled by the time it is reduced.
    Succeed {
        /// Request this result belongs to
        request_id: RequestId,
        /// Decoded response body
        payload: Value,
        /// Correlation payload supplied at send time
        extra: Option<X>,
        /// Token of the request
        token: CancellationToken,
    },

    /// The request failed
    ///
    /// Ignored if `token` was cancelled by the time it is reduced.
    Fail {
        /// Request this result belongs to
        request_id: RequestId,
        /// User-facing message
        message: String,
        /// Token of the request
        token: CancellationToken,
    },

    /// Return to the initial Idle snapshot
    Reset,
}

impl<X> RequestAction<X> {
    /// Tag of this action
    #[must_use]
    pub const fn kind(&self) -> RequestActionKind {
        match self {
            Self::Send { .. } => RequestActionKind::Send,
            Self::Succeed { .. } => RequestActionKind::Succeed,
            Self::Fail { .. } => RequestActionKind::Fail,
            Self::Reset => RequestActionKind::Reset,
        }
    }
}

/// Tag of a [`RequestAction`], as used in logs and metrics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestActionKind {
    /// See [`RequestAction::Send`]
    Send,
    /// See [`RequestAction::Succeed`]
    Succeed,
    /// See [`RequestAction::Fail`]
    Fail,
    /// See [`RequestAction::Reset`]
    Reset,
}

impl RequestActionKind {
    /// Canonical tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "SEND",
            Self::Succeed => "RESPONSE",
            Self::Fail => "ERROR",
            Self::Reset => "CLEAR",
        }
    }
}

impl std::fmt::Display for RequestActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition tag that names no known transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown request transition: {0:?}")]
pub struct UnknownTransition(pub String);

impl FromStr for RequestActionKind {
    type Err = UnknownTransition;

    /// Parse a tag, case-insensitively
    ///
    /// Both the canonical tags (`SEND`, `RESPONSE`, `ERROR`, `CLEAR`) and the
    /// variant names (`succeed`, `fail`, `reset`) are accepted.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "SEND" => Ok(Self::Send),
            "RESPONSE" | "SUCCEED" => Ok(Self::Succeed),
            "ERROR" | "FAIL" => Ok(Self::Fail),
            "CLEAR" | "RESET" => Ok(Self::Reset),
            _ => Err(UnknownTransition(tag.to_string())),
        }
    }
}

//! Debounced search by title.
//!
//! Typing updates the filter immediately. The query only goes out once the
//! filter has stayed the same for the debounce delay.

use crate::types::{Ingredient, IngredientId};
use pantry_core::{async_effect, delay, effect::Effect, reducer::Reducer, smallvec, SmallVec};
use pantry_http::{Method, RequestDispatcher, SupersedePolicy};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;

/// Delay between the last keystroke and the query
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Build the query URL for a title filter
///
/// An empty filter lists the whole collection. Otherwise the store is asked
/// for entries whose `title` equals the filter exactly.
#[must_use]
pub fn search_url(collection: &Url, filter: &str) -> String {
    let mut url = collection.clone();
    if !filter.is_empty() {
        let quoted = Value::String(filter.to_string()).to_string();
        url.query_pairs_mut()
            .append_pair("orderBy", "\"title\"")
            .append_pair("equalTo", &quoted);
    }
    url.to_string()
}

/// Turn a collection response into ingredients
///
/// The store answers with an object keyed by ingredient id, or `null` when
/// nothing matches. Entries without a string `title` and `amount` are skipped.
#[must_use]
pub fn parse_ingredients(payload: &Value) -> Vec<Ingredient> {
    let entries = match payload {
        Value::Null => return Vec::new(),
        Value::Object(entries) => entries,
        other => {
            tracing::warn!(payload = %other, "Unexpected search response, expected an object");
            return Vec::new();
        },
    };

    entries
        .iter()
        .filter_map(|(key, entry)| {
            let title = entry.get("title").and_then(Value::as_str);
            let amount = entry.get("amount").and_then(Value::as_str);
            match (title, amount) {
                (Some(title), Some(amount)) => Some(Ingredient {
                    id: IngredientId::new(key.as_str()),
                    title: title.to_string(),
                    amount: amount.to_string(),
                }),
                _ => {
                    tracing::warn!(id = %key, "Skipping malformed ingredient entry");
                    None
                },
            }
        })
        .collect()
}

/// Search state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchState {
    /// Current filter text
    pub filter: String,
    /// Last query URL sent
    pub last_query: Option<String>,
}

/// Search actions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchAction {
    /// The user edited the filter
    FilterChanged(String),
    /// The debounce delay for this filter text has passed
    DebounceElapsed(String),
    /// Query the current filter now
    Refresh,
}

/// Dependencies of [`SearchReducer`]
#[derive(Clone, Debug)]
pub struct SearchEnvironment {
    /// Where queries are sent; its results replace the ingredient list
    pub requests: RequestDispatcher<()>,
    /// The ingredient collection
    pub collection: Url,
    /// Debounce delay
    pub debounce: Duration,
}

impl SearchEnvironment {
    /// Create an environment with the default debounce delay
    ///
    /// Searches use [`SupersedePolicy::LatestRequestWins`], so results for
    /// an outdated filter never replace newer ones.
    #[must_use]
    pub fn new(requests: RequestDispatcher<()>, collection: Url) -> Self {
        Self {
            requests: requests.with_policy(SupersedePolicy::LatestRequestWins),
            collection,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Set the debounce delay
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Reducer for [`SearchState`]
#[derive(Clone, Debug, Default)]
pub struct SearchReducer;

impl SearchReducer {
    fn query(state: &mut SearchState, env: &SearchEnvironment) -> Effect<SearchAction> {
        let url = search_url(&env.collection, &state.filter);
        state.last_query = Some(url.clone());

        let requests = env.requests.clone();
        async_effect! {
            tracing::debug!(%url, "Searching ingredients");
            if let Err(error) = requests.send(&url, Method::Get, None, None, None) {
                tracing::warn!(%url, error = %error, "Search could not be sent");
            }
            None
        }
    }
}

impl Reducer for SearchReducer {
    type State = SearchState;
    type Action = SearchAction;
    type Environment = SearchEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SearchAction::FilterChanged(filter) => {
                state.filter.clone_from(&filter);
                smallvec![delay! {
                    duration: env.debounce,
                    action: SearchAction::DebounceElapsed(filter)
                }]
            },
            SearchAction::DebounceElapsed(filter) if filter == state.filter => {
                smallvec![Self::query(state, env)]
            },
            SearchAction::DebounceElapsed(filter) => {
                tracing::trace!(%filter, current = %state.filter, "Debounce superseded");
                smallvec![Effect::None]
            },
            SearchAction::Refresh => smallvec![Self::query(state, env)],
        }
    }
}

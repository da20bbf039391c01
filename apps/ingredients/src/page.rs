//! The ingredients page: list, add form, removal and search wired together.
//!
//! Two request dispatchers do the network work. One carries mutations (add,
//! remove) and one carries searches. Subscriptions on both feed the local
//! ingredient list once results arrive.

use crate::config::{ConfigError, DatabaseConfig};
use crate::reducer::{IngredientsAction, IngredientsReducer, IngredientsState};
use crate::search::{parse_ingredients, SearchAction, SearchEnvironment, SearchReducer, SearchState};
use crate::types::{
    Ingredient, IngredientId, NewIngredient, PendingChange, ADD_INGREDIENT, REMOVE_INGREDIENT,
};
use pantry_core::environment::HttpClient;
use pantry_http::{
    DispatchError, Method, RequestBody, RequestDispatcher, RequestId, RequestState,
    RequestStatus, RequestTicket, SubscriptionId,
};
use pantry_runtime::{Store, StoreError};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

type ListStore = Store<IngredientsState, IngredientsAction, (), IngredientsReducer>;
type SearchStore = Store<SearchState, SearchAction, SearchEnvironment, SearchReducer>;

/// Errors from page operations
#[derive(Error, Debug)]
pub enum PageError {
    /// A request could not be sent
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A local store rejected an action
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No request URL could be built
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What the front-end renders
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageView {
    /// Current list
    pub ingredients: Vec<Ingredient>,
    /// A mutation is in flight (the add form shows a spinner)
    pub loading: bool,
    /// A search is in flight
    pub searching: bool,
    /// Message to show in the error dialog
    pub error: Option<String>,
    /// Current search filter
    pub filter: String,
}

/// Remembers which resolution was last handled
#[derive(Default)]
struct Seen(Mutex<Option<RequestId>>);

impl Seen {
    /// Whether this snapshot carries a resolution not handled yet
    fn first_time<X>(&self, state: &RequestState<X>) -> bool {
        if state.status() != RequestStatus::Succeeded {
            return false;
        }
        let mut last = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if *last == state.resolved() {
            return false;
        }
        *last = state.resolved();
        true
    }
}

/// The ingredients page
pub struct IngredientsPage {
    config: DatabaseConfig,
    list: ListStore,
    mutations: RequestDispatcher<PendingChange>,
    searches: RequestDispatcher<()>,
    search: SearchStore,
    subscriptions: [SubscriptionId; 2],
}

impl IngredientsPage {
    /// Build the page around an HTTP client
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, config: DatabaseConfig) -> Self {
        let list = Store::new(IngredientsState::default(), IngredientsReducer::new(), ());
        let mutations = RequestDispatcher::<PendingChange>::new(Arc::clone(&client));

        let search_env = SearchEnvironment::new(
            RequestDispatcher::new(client),
            config.collection_url().clone(),
        )
        .with_debounce(config.search_debounce);
        let searches = search_env.requests.clone();
        let search = Store::new(SearchState::default(), SearchReducer, search_env);

        let added = Self::on_mutation_resolved(list.clone());
        let loaded = Self::on_search_resolved(list.clone());
        let subscriptions = [mutations.subscribe(added), searches.subscribe(loaded)];

        Self {
            config,
            list,
            mutations,
            searches,
            search,
            subscriptions,
        }
    }

    fn on_mutation_resolved(
        list: ListStore,
    ) -> impl Fn(&RequestState<PendingChange>) + Send + Sync + 'static {
        let seen = Seen::default();
        move |state: &RequestState<PendingChange>| {
            if !seen.first_time(state) {
                return;
            }
            // The identifier names the latest send, which may be newer than the
            // resolved one; the extra always belongs to the resolved request.
            let Some(PendingChange::Add(new)) = state.extra() else {
                return;
            };
            let Some(key) = state.data().and_then(|data| data.get("name")).and_then(|v| v.as_str())
            else {
                tracing::warn!(title = %new.title, "Add response carried no key");
                return;
            };

            let ingredient = Ingredient::from_new(IngredientId::new(key), new.clone());
            if let Err(error) = list.send(IngredientsAction::Add(ingredient)) {
                tracing::warn!(error = %error, "Could not add ingredient to list");
            }
        }
    }

    fn on_search_resolved(list: ListStore) -> impl Fn(&RequestState<()>) + Send + Sync + 'static {
        let seen = Seen::default();
        move |state: &RequestState<()>| {
            if !seen.first_time(state) {
                return;
            }
            let ingredients = state.data().map(parse_ingredients).unwrap_or_default();
            tracing::debug!(count = ingredients.len(), "Search results loaded");
            if let Err(error) = list.send(IngredientsAction::Set(ingredients)) {
                tracing::warn!(error = %error, "Could not replace ingredient list");
            }
        }
    }

    /// Store a new ingredient
    ///
    /// It appears in the list once the store has assigned its key.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Dispatch`] if the request cannot be sent.
    pub fn add_ingredient(&self, ingredient: NewIngredient) -> Result<RequestTicket, PageError> {
        tracing::info!(title = %ingredient.title, amount = %ingredient.amount, "Adding ingredient");
        let body = RequestBody::json(&ingredient)?;
        let ticket = self.mutations.send(
            self.config.collection_url().as_str(),
            Method::Post,
            Some(body.into()),
            Some(PendingChange::Add(ingredient)),
            Some(ADD_INGREDIENT),
        )?;
        Ok(ticket)
    }

    /// Delete an ingredient
    ///
    /// It leaves the list immediately, whatever the outcome of the request.
    ///
    /// # Errors
    ///
    /// Returns [`PageError`] if the request cannot be sent.
    pub fn remove_ingredient(&self, id: &IngredientId) -> Result<RequestTicket, PageError> {
        tracing::info!(%id, "Removing ingredient");
        let url = self.config.item_url(id)?;
        let ticket = self.mutations.send(
            url.as_str(),
            Method::Delete,
            None,
            Some(PendingChange::Remove(id.clone())),
            Some(REMOVE_INGREDIENT),
        )?;
        self.list.send(IngredientsAction::Delete(id.clone()))?;
        Ok(ticket)
    }

    /// Update the search filter
    ///
    /// The query is sent once the filter has been stable for the debounce delay.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the search store rejects the action.
    pub fn set_filter(&self, filter: impl Into<String>) -> Result<(), PageError> {
        self.search.send(SearchAction::FilterChanged(filter.into()))?;
        Ok(())
    }

    /// Query the current filter right away
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Store`] if the search store rejects the action.
    pub fn load(&self) -> Result<(), PageError> {
        self.search.send(SearchAction::Refresh)?;
        Ok(())
    }

    /// Dismiss the error dialog
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Dispatch`] if a dispatcher rejects the reset.
    pub fn clear_error(&self) -> Result<(), PageError> {
        if self.mutations.state(|s| s.error().is_some()) {
            self.mutations.reset()?;
        }
        if self.searches.state(|s| s.error().is_some()) {
            self.searches.reset()?;
        }
        Ok(())
    }

    /// Snapshot for rendering
    #[must_use]
    pub fn view(&self) -> PageView {
        let mutation = self.mutations.snapshot();
        let search = self.searches.snapshot();

        PageView {
            ingredients: self.list.state(|s| s.ingredients.clone()),
            loading: mutation.is_loading(),
            searching: search.is_loading(),
            error: mutation
                .error()
                .or_else(|| search.error())
                .map(str::to_string),
            filter: self.search.state(|s| s.filter.clone()),
        }
    }

    /// Whether any request, debounce or result is still pending
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.mutations.pending_requests() > 0
            || self.searches.pending_requests() > 0
            || self.search.pending_effects() > 0
    }

    /// Wait until nothing is pending
    ///
    /// Returns `false` if still busy when the timeout expires.
    pub async fn settle(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.is_busy() {
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        true
    }

    /// The configuration in use
    #[must_use]
    pub const fn config(&self) -> &DatabaseConfig {
        &self.config
    }
}

impl Drop for IngredientsPage {
    fn drop(&mut self) {
        let [mutation, search] = self.subscriptions;
        self.mutations.unsubscribe(mutation);
        self.searches.unsubscribe(search);
    }
}

impl std::fmt::Debug for IngredientsPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngredientsPage")
            .field("config", &self.config)
            .field("view", &self.view())
            .finish_non_exhaustive()
    }
}

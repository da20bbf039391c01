//! Configuration management for the ingredients application.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Only the database URL is required.

use crate::search::DEFAULT_DEBOUNCE;
use crate::types::IngredientId;
use reqwest::Url;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Base URL of the remote document store
pub const DATABASE_URL_VAR: &str = "PANTRY_DATABASE_URL";
/// Request timeout in seconds
pub const REQUEST_TIMEOUT_VAR: &str = "PANTRY_REQUEST_TIMEOUT_SECS";
/// Search debounce delay in milliseconds
pub const SEARCH_DEBOUNCE_VAR: &str = "PANTRY_SEARCH_DEBOUNCE_MS";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// The database URL does not parse
    #[error("Invalid database URL {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected value
        url: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Where the ingredient collection lives and how to talk to it
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    base_url: String,
    collection: Url,
    /// Timeout for each request (default: 30s)
    pub request_timeout: Duration,
    /// Search debounce delay (default: 500ms)
    pub search_debounce: Duration,
}

impl DatabaseConfig {
    /// Create a configuration with default timings
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let collection = Url::parse(&format!("{base_url}/ingredients.json")).map_err(|e| {
            ConfigError::InvalidUrl {
                url: base_url.clone(),
                reason: e.to_string(),
            }
        })?;
        if collection.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl {
                url: base_url,
                reason: "not a hierarchical URL".to_string(),
            });
        }

        Ok(Self {
            base_url,
            collection,
            request_timeout: Duration::from_secs(30),
            search_debounce: DEFAULT_DEBOUNCE,
        })
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `PANTRY_DATABASE_URL` is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through a variable lookup
    ///
    /// Unparseable timings fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the database URL is missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(DATABASE_URL_VAR).ok_or(ConfigError::Missing(DATABASE_URL_VAR))?;
        let mut config = Self::new(&base_url)?;

        if let Some(secs) = lookup(REQUEST_TIMEOUT_VAR).and_then(|s| s.parse().ok()) {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = lookup(SEARCH_DEBOUNCE_VAR).and_then(|s| s.parse().ok()) {
            config.search_debounce = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the search debounce delay
    #[must_use]
    pub const fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the ingredient collection
    #[must_use]
    pub const fn collection_url(&self) -> &Url {
        &self.collection
    }

    /// URL of one ingredient
    ///
    /// The id always lands in a single escaped path segment under
    /// `/ingredients/`, whatever characters it contains.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the collection URL cannot hold
    /// a path.
    pub fn item_url(&self, id: &IngredientId) -> Result<Url, ConfigError> {
        let mut url = self.collection.clone();
        url.path_segments_mut()
            .map_err(|()| ConfigError::InvalidUrl {
                url: self.base_url.clone(),
                reason: "not a hierarchical URL".to_string(),
            })?
            .pop()
            .push("ingredients")
            .push(&format!("{id}.json"));
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn requires_database_url() {
        let result = DatabaseConfig::from_lookup(lookup(&[]));
        assert_eq!(result.err(), Some(ConfigError::Missing(DATABASE_URL_VAR)));
    }

    #[test]
    fn rejects_invalid_database_url() {
        let result = DatabaseConfig::from_lookup(lookup(&[(DATABASE_URL_VAR, "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn builds_collection_and_item_urls() {
        let Ok(config) =
            DatabaseConfig::from_lookup(lookup(&[(DATABASE_URL_VAR, "https://db.test/")]))
        else {
            unreachable!("valid config");
        };

        assert_eq!(config.base_url(), "https://db.test");
        assert_eq!(config.collection_url().as_str(), "https://db.test/ingredients.json");
        assert_eq!(
            config.item_url(&IngredientId::new("k1")).map(String::from),
            Ok("https://db.test/ingredients/k1.json".to_string())
        );
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.search_debounce, DEFAULT_DEBOUNCE);
    }

    #[test]
    fn item_url_keeps_hostile_ids_inside_the_collection() {
        let Ok(config) = DatabaseConfig::new("https://db.test/root") else {
            unreachable!("valid config");
        };

        let cases = [
            ("../", "https://db.test/root/ingredients/..%2F.json"),
            ("..", "https://db.test/root/ingredients/...json"),
            ("a?x=", "https://db.test/root/ingredients/a%3Fx=.json"),
            ("a#b", "https://db.test/root/ingredients/a%23b.json"),
            ("a/b", "https://db.test/root/ingredients/a%2Fb.json"),
        ];
        for (id, expected) in cases {
            let Ok(url) = config.item_url(&IngredientId::new(id)) else {
                unreachable!("hierarchical base");
            };
            assert_eq!(url.as_str(), expected, "id {id:?}");
            assert!(url.query().is_none());
            assert!(url.fragment().is_none());
            assert_eq!(url.path_segments().map(Iterator::count), Some(3));
        }
    }

    #[test]
    fn rejects_non_hierarchical_database_url() {
        let result = DatabaseConfig::new("mailto:cook@example.com");
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn reads_timings_and_ignores_garbage() {
        let Ok(config) = DatabaseConfig::from_lookup(lookup(&[
            (DATABASE_URL_VAR, "https://db.test"),
            (REQUEST_TIMEOUT_VAR, "5"),
            (SEARCH_DEBOUNCE_VAR, "soon"),
        ])) else {
            unreachable!("valid config");
        };

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.search_debounce, DEFAULT_DEBOUNCE);
    }
}

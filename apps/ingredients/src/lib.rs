//! Ingredient list manager.
//!
//! Ingredients live in a remote JSON document store. This crate keeps a local
//! list in sync with it through the Pantry request lifecycle:
//!
//! - adding POSTs the ingredient and appends it once the store returns its key
//! - removing DELETEs it and drops it from the list right away
//! - searching queries by exact title after a debounce and replaces the list
//! - a session gate decides between the login screen and the list
//!
//! # Quick Start
//!
//! ```no_run
//! use ingredients::{DatabaseConfig, IngredientsPage, NewIngredient};
//! use pantry_http::ReqwestClient;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatabaseConfig::new("https://my-db.example.com")?;
//! let page = IngredientsPage::new(Arc::new(ReqwestClient::new()?), config);
//!
//! page.load()?;
//! let mut ticket = page.add_ingredient(NewIngredient::new("Sugar", "2"))?;
//! ticket.wait().await;
//! page.settle(Duration::from_secs(5)).await;
//!
//! for ingredient in page.view().ingredients {
//!     println!("{} ({})", ingredient.title, ingredient.amount);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod page;
pub mod reducer;
pub mod search;
pub mod session;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigError, DatabaseConfig};
pub use page::{IngredientsPage, PageError, PageView};
pub use reducer::{IngredientsAction, IngredientsReducer, IngredientsState};
pub use search::{parse_ingredients, search_url, SearchAction, SearchReducer, SearchState};
pub use session::{App, Screen, Session};
pub use types::{Ingredient, IngredientId, NewIngredient, PendingChange};

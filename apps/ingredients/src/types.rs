//! Domain types for the ingredient list.

use serde::{Deserialize, Serialize};

/// Request identifier for adding an ingredient
pub const ADD_INGREDIENT: &str = "ADD_INGREDIENT";

/// Request identifier for removing an ingredient
pub const REMOVE_INGREDIENT: &str = "REMOVE_INGREDIENT";

/// Key assigned to an ingredient by the remote store
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngredientId(String);

impl IngredientId {
    /// Wrap a server-assigned key
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as sent on the wire
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IngredientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ingredient in the list
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Server-assigned key
    pub id: IngredientId,
    /// Name, also what search matches on
    pub title: String,
    /// Free-form quantity
    pub amount: String,
}

impl Ingredient {
    /// Attach a server-assigned key to a new ingredient
    #[must_use]
    pub fn from_new(id: IngredientId, new: NewIngredient) -> Self {
        Self {
            id,
            title: new.title,
            amount: new.amount,
        }
    }
}

/// An ingredient that has not been stored yet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIngredient {
    /// Name
    pub title: String,
    /// Free-form quantity
    pub amount: String,
}

impl NewIngredient {
    /// Create a new ingredient
    #[must_use]
    pub fn new(title: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            amount: amount.into(),
        }
    }
}

/// Correlation payload of a mutation request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingChange {
    /// Adding this ingredient; its key arrives in the response
    Add(NewIngredient),
    /// Removing the ingredient with this key
    Remove(IngredientId),
}

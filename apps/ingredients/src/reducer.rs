//! Reducer for the local ingredient list.

use crate::types::{Ingredient, IngredientId};
use pantry_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};

/// The ingredients currently shown
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngredientsState {
    /// In display order
    pub ingredients: Vec<Ingredient>,
}

impl IngredientsState {
    /// Number of ingredients
    #[must_use]
    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Look up an ingredient by key
    #[must_use]
    pub fn get(&self, id: &IngredientId) -> Option<&Ingredient> {
        self.ingredients.iter().find(|ingredient| &ingredient.id == id)
    }
}

/// Changes to the ingredient list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngredientsAction {
    /// Replace the whole list (search results)
    Set(Vec<Ingredient>),
    /// Append one ingredient
    Add(Ingredient),
    /// Remove every ingredient with this key
    Delete(IngredientId),
}

/// Reducer for [`IngredientsState`]
///
/// Purely local: the network side of adding and removing goes through the
/// request lifecycle, which feeds this reducer once it has a result.
#[derive(Clone, Debug, Default)]
pub struct IngredientsReducer;

impl IngredientsReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for IngredientsReducer {
    type State = IngredientsState;
    type Action = IngredientsAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            IngredientsAction::Set(ingredients) => {
                tracing::debug!(count = ingredients.len(), "Ingredient list replaced");
                state.ingredients = ingredients;
            },
            IngredientsAction::Add(ingredient) => {
                tracing::debug!(id = %ingredient.id, title = %ingredient.title, "Ingredient added");
                state.ingredients.push(ingredient);
            },
            IngredientsAction::Delete(id) => {
                tracing::debug!(id = %id, "Ingredient deleted");
                state.ingredients.retain(|ingredient| ingredient.id != id);
            },
        }
        smallvec![Effect::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pantry_testing::{assertions, ReducerTest};

    fn ingredient(id: &str, title: &str) -> Ingredient {
        Ingredient {
            id: IngredientId::new(id),
            title: title.to_string(),
            amount: "1".to_string(),
        }
    }

    #[test]
    fn set_replaces_the_list() {
        ReducerTest::new(IngredientsReducer::new())
            .with_env(())
            .given_state(IngredientsState {
                ingredients: vec![ingredient("a", "Salt")],
            })
            .when_action(IngredientsAction::Set(vec![
                ingredient("b", "Sugar"),
                ingredient("c", "Flour"),
            ]))
            .then_state(|state| {
                assert_eq!(state.len(), 2);
                assert!(state.get(&IngredientId::new("a")).is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn add_appends() {
        ReducerTest::new(IngredientsReducer::new())
            .with_env(())
            .given_state(IngredientsState {
                ingredients: vec![ingredient("a", "Salt")],
            })
            .when_action(IngredientsAction::Add(ingredient("b", "Sugar")))
            .then_state(|state| {
                let titles: Vec<_> = state.ingredients.iter().map(|i| i.title.as_str()).collect();
                assert_eq!(titles, vec!["Salt", "Sugar"]);
            })
            .run();
    }

    #[test]
    fn delete_removes_matching_id_only() {
        ReducerTest::new(IngredientsReducer::new())
            .with_env(())
            .given_state(IngredientsState::default())
            .when_actions([
                IngredientsAction::Add(ingredient("a", "Salt")),
                IngredientsAction::Add(ingredient("b", "Sugar")),
                IngredientsAction::Delete(IngredientId::new("a")),
                IngredientsAction::Delete(IngredientId::new("missing")),
            ])
            .then_state(|state| {
                assert_eq!(state.ingredients, vec![ingredient("b", "Sugar")]);
            })
            .run();
    }
}

//! The pantry aggregate: everything one user keeps. That is ingredients,
//! recipes with their favorites, ratings and collections, meal plans, fridge
//! stock and the shopping list.
//!
//! Operations on each collection live next to the view they produce
//! (`fridge`, `shopping`, `planning`, `recipe`, `collections`, `ratings`);
//! this module owns the data and the lookups they share.

use crate::error::PantryError;
use crate::models::{
    Favorite, FridgeItem, Ingredient, MealPlan, Rating, Recipe, RecipeCollection, RecipeIngredient,
    ShoppingItem,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pantry {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub meal_plans: Vec<MealPlan>,
    #[serde(default)]
    pub fridge: Vec<FridgeItem>,
    #[serde(default)]
    pub shopping_list: Vec<ShoppingItem>,
    #[serde(default)]
    pub favorites: Vec<Favorite>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
    #[serde(default)]
    pub collections: Vec<RecipeCollection>,
    #[serde(default)]
    next_id: u64,
}

/// How a caller names an ingredient.
#[derive(Debug, Clone, PartialEq)]
pub enum IngredientRef {
    Id(u64),
    Name(String),
}

/// Whether an upsert replaced an existing entry or added a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipeIngredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub directions: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<NewRecipeIngredient>,
}

impl Pantry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id. Ids are shared across collections and never reused,
    /// even for a pantry file written by hand without a counter.
    pub(crate) fn allocate_id(&mut self) -> u64 {
        let highest = self
            .ingredients
            .iter()
            .map(|i| i.id)
            .chain(self.recipes.iter().map(|r| r.id))
            .chain(self.meal_plans.iter().map(|m| m.id))
            .chain(self.fridge.iter().map(|f| f.id))
            .chain(self.shopping_list.iter().map(|s| s.id))
            .chain(self.ratings.iter().map(|r| r.id))
            .chain(self.collections.iter().map(|c| c.id))
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest) + 1;
        self.next_id
    }

    pub fn ingredient(&self, id: u64) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    /// Case-insensitive lookup by name.
    pub fn find_ingredient(&self, name: &str) -> Option<&Ingredient> {
        let wanted = name.trim().to_lowercase();
        self.ingredients
            .iter()
            .find(|i| i.name.to_lowercase() == wanted)
    }

    pub fn resolve_ingredient(&self, reference: &IngredientRef) -> Option<&Ingredient> {
        match reference {
            IngredientRef::Id(id) => self.ingredient(*id),
            IngredientRef::Name(name) => self.find_ingredient(name),
        }
    }

    /// Return the id of the ingredient called `name`, adding it (lowercased)
    /// when it does not exist yet.
    pub fn find_or_create_ingredient(&mut self, name: &str, default_unit: Option<&str>) -> u64 {
        if let Some(existing) = self.find_ingredient(name) {
            return existing.id;
        }

        let id = self.allocate_id();
        let name = name.trim().to_lowercase();
        tracing::debug!(id, name = %name, "creating ingredient");
        self.ingredients.push(Ingredient {
            id,
            name,
            default_unit: default_unit.map(str::to_string),
        });
        id
    }

    pub fn recipe(&self, id: u64) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub(crate) fn require_recipe(&self, id: u64) -> Result<&Recipe, PantryError> {
        self.recipe(id)
            .ok_or_else(|| PantryError::not_found("Recipe", id))
    }

    /// Name of an ingredient for display, empty when the id is dangling.
    pub(crate) fn ingredient_name(&self, id: u64) -> String {
        self.ingredient(id)
            .map(|i| i.name.clone())
            .unwrap_or_default()
    }

    /// Turn submitted ingredient lines into recipe rows, creating unknown
    /// ingredients. A repeated ingredient keeps its first line.
    pub(crate) fn resolve_recipe_ingredients(
        &mut self,
        title: &str,
        lines: Vec<NewRecipeIngredient>,
    ) -> Vec<RecipeIngredient> {
        let mut ingredients: Vec<RecipeIngredient> = Vec::new();
        for line in lines {
            let ingredient_id = self.find_or_create_ingredient(&line.name, line.unit.as_deref());
            if ingredients.iter().any(|i| i.ingredient_id == ingredient_id) {
                tracing::warn!(
                    recipe = %title,
                    ingredient = %line.name,
                    "ingredient listed twice, keeping the first entry"
                );
                continue;
            }
            ingredients.push(RecipeIngredient {
                ingredient_id,
                quantity: line.quantity,
                unit: line.unit,
            });
        }
        ingredients
    }

    pub fn add_recipe(&mut self, new_recipe: NewRecipe) -> Result<u64, PantryError> {
        let title = new_recipe.title.trim();
        if title.is_empty() {
            return Err(PantryError::MissingField("title"));
        }
        let title = title.to_string();

        let ingredients = self.resolve_recipe_ingredients(&title, new_recipe.ingredients);

        let id = self.allocate_id();
        self.recipes.push(Recipe {
            id,
            title,
            description: new_recipe.description,
            category: new_recipe.category,
            cuisine: new_recipe.cuisine,
            meal_type: new_recipe.meal_type,
            is_vegan: new_recipe.is_vegan,
            is_vegetarian: new_recipe.is_vegetarian,
            directions: new_recipe.directions,
            ingredients,
            created_at: Utc::now(),
        });
        tracing::info!(id, "recipe added");
        Ok(id)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn ingredient(name: &str, quantity: Option<f64>, unit: Option<&str>) -> NewRecipeIngredient {
        NewRecipeIngredient {
            name: name.to_string(),
            quantity,
            unit: unit.map(str::to_string),
        }
    }

    pub fn recipe(title: &str, ingredients: Vec<NewRecipeIngredient>) -> NewRecipe {
        NewRecipe {
            title: title.to_string(),
            description: None,
            category: None,
            cuisine: None,
            meal_type: None,
            is_vegan: false,
            is_vegetarian: false,
            directions: None,
            ingredients,
        }
    }
}

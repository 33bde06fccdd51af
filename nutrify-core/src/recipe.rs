//! The recipe catalog: searchable list, detail view with unit alternatives for
//! every ingredient, update and delete.

use crate::error::PantryError;
use crate::models::Recipe;
use crate::pantry::{NewRecipeIngredient, Pantry};
use crate::ratings::RatingsSummary;
use crate::units::{format_quantity_with_conversions, Alternative};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Meal types offered as filters before any recipe names its own.
pub const DEFAULT_MEAL_TYPES: [&str; 5] = ["breakfast", "lunch", "dinner", "snack", "dessert"];

/// Sort field for the recipe list
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSort {
    #[default]
    CreatedAt,
    Title,
}

impl RecipeSort {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "created_at" => Some(RecipeSort::CreatedAt),
            "title" => Some(RecipeSort::Title),
            _ => None,
        }
    }
}

/// Sort direction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    /// Newest or last title first
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Recipe list filters. Every field that is set must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeFilter {
    /// Case-insensitive substring of the title or description
    #[serde(default)]
    pub search: Option<String>,
    /// Each term must be part of some ingredient name
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// No ingredient name may contain any of these terms
    #[serde(default)]
    pub exclude_ingredients: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub is_vegan: Option<bool>,
    #[serde(default)]
    pub is_vegetarian: Option<bool>,
    #[serde(default)]
    pub sort_by: RecipeSort,
    #[serde(default)]
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cuisine: Option<String>,
    pub meal_type: Option<String>,
    pub is_vegan: bool,
    pub is_vegetarian: bool,
    pub num_ingredients: usize,
    pub average_rating: Option<f64>,
    pub is_favorite: bool,
    pub in_collections_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortOption {
    pub value: RecipeSort,
    pub label: &'static str,
}

/// The values a recipe list can currently be filtered by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub cuisines: Vec<String>,
    pub meal_types: Vec<String>,
    pub sort_options: Vec<SortOption>,
}

/// Fields left as `None` keep their current value. New ingredients replace
/// the whole ingredient list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub is_vegan: Option<bool>,
    #[serde(default)]
    pub is_vegetarian: Option<bool>,
    #[serde(default)]
    pub directions: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<NewRecipeIngredient>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeDeletion {
    pub favorites_removed: usize,
    pub ratings_removed: usize,
    pub collections_touched: usize,
    pub meal_plans_cleared: usize,
}

fn same_text(value: Option<&str>, wanted: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase() == wanted.trim().to_lowercase())
}

/// Lowercased, trimmed, non-empty terms.
fn terms(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn distinct(values: impl Iterator<Item = Option<String>>) -> Vec<String> {
    values
        .flatten()
        .filter(|v| !v.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientLine {
    pub id: u64,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub alternatives: Vec<Alternative>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeDetail {
    pub id: u64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cuisine: Option<String>,
    pub meal_type: Option<String>,
    pub is_vegan: bool,
    pub is_vegetarian: bool,
    pub directions: Option<String>,
    pub ingredients: Vec<IngredientLine>,
    pub ratings: RatingsSummary,
    pub is_favorite: bool,
    pub in_collections_count: usize,
    pub created_at: DateTime<Utc>,
}

impl Pantry {
    pub fn recipe_detail(&self, id: u64) -> Option<RecipeDetail> {
        let recipe = self.recipe(id)?;

        let ingredients = recipe
            .ingredients
            .iter()
            .map(|ri| {
                let formatted =
                    format_quantity_with_conversions(ri.quantity, ri.unit.as_deref(), true);
                IngredientLine {
                    id: ri.ingredient_id,
                    name: self.ingredient_name(ri.ingredient_id),
                    quantity: formatted.quantity,
                    unit: formatted.unit,
                    alternatives: formatted.alternatives,
                }
            })
            .collect();

        Some(RecipeDetail {
            id: recipe.id,
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            category: recipe.category.clone(),
            cuisine: recipe.cuisine.clone(),
            meal_type: recipe.meal_type.clone(),
            is_vegan: recipe.is_vegan,
            is_vegetarian: recipe.is_vegetarian,
            directions: recipe.directions.clone(),
            ingredients,
            ratings: self.ratings_summary(recipe.id),
            is_favorite: self.is_favorite(recipe.id),
            in_collections_count: self.in_collections_count(recipe.id),
            created_at: recipe.created_at,
        })
    }

    pub(crate) fn recipe_summary(&self, recipe: &Recipe) -> RecipeSummary {
        RecipeSummary {
            id: recipe.id,
            title: recipe.title.clone(),
            description: recipe.description.clone(),
            category: recipe.category.clone(),
            cuisine: recipe.cuisine.clone(),
            meal_type: recipe.meal_type.clone(),
            is_vegan: recipe.is_vegan,
            is_vegetarian: recipe.is_vegetarian,
            num_ingredients: recipe.ingredients.len(),
            average_rating: self.ratings_summary(recipe.id).average,
            is_favorite: self.is_favorite(recipe.id),
            in_collections_count: self.in_collections_count(recipe.id),
            created_at: recipe.created_at,
        }
    }

    fn ingredient_names(&self, recipe: &Recipe) -> Vec<String> {
        recipe
            .ingredients
            .iter()
            .map(|ri| self.ingredient_name(ri.ingredient_id).to_lowercase())
            .collect()
    }

    fn matches_filter(&self, recipe: &Recipe, filter: &RecipeFilter) -> bool {
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let search = search.to_lowercase();
            let in_title = recipe.title.to_lowercase().contains(&search);
            let in_description = recipe
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&search));
            if !in_title && !in_description {
                return false;
            }
        }

        let checks = [
            (filter.category.as_deref(), recipe.category.as_deref()),
            (filter.cuisine.as_deref(), recipe.cuisine.as_deref()),
            (filter.meal_type.as_deref(), recipe.meal_type.as_deref()),
        ];
        for (wanted, actual) in checks {
            if let Some(wanted) = wanted.filter(|w| !w.trim().is_empty()) {
                if !same_text(actual, wanted) {
                    return false;
                }
            }
        }

        if filter.is_vegan.is_some_and(|v| v != recipe.is_vegan)
            || filter.is_vegetarian.is_some_and(|v| v != recipe.is_vegetarian)
        {
            return false;
        }

        let included = terms(&filter.ingredients);
        let excluded = terms(&filter.exclude_ingredients);
        if included.is_empty() && excluded.is_empty() {
            return true;
        }

        let names = self.ingredient_names(recipe);
        let has = |term: &String| names.iter().any(|n| n.contains(term.as_str()));
        included.iter().all(has) && !excluded.iter().any(has)
    }

    /// Recipes matching `filter`, sorted as it asks.
    pub fn recipe_list(&self, filter: &RecipeFilter) -> Vec<RecipeSummary> {
        let mut recipes: Vec<&Recipe> = self
            .recipes
            .iter()
            .filter(|r| self.matches_filter(r, filter))
            .collect();

        recipes.sort_by(|a, b| {
            let ordering: Ordering = match filter.sort_by {
                RecipeSort::CreatedAt => a.created_at.cmp(&b.created_at),
                RecipeSort::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            }
            .then_with(|| a.id.cmp(&b.id));
            match filter.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        recipes.into_iter().map(|r| self.recipe_summary(r)).collect()
    }

    pub fn recipe_filters(&self) -> FilterOptions {
        let mut meal_types = distinct(self.recipes.iter().map(|r| r.meal_type.clone()));
        if meal_types.is_empty() {
            meal_types = DEFAULT_MEAL_TYPES.iter().map(|m| m.to_string()).collect();
        }

        FilterOptions {
            categories: distinct(self.recipes.iter().map(|r| r.category.clone())),
            cuisines: distinct(self.recipes.iter().map(|r| r.cuisine.clone())),
            meal_types,
            sort_options: vec![
                SortOption {
                    value: RecipeSort::CreatedAt,
                    label: "Date Added",
                },
                SortOption {
                    value: RecipeSort::Title,
                    label: "Title",
                },
            ],
        }
    }

    pub fn update_recipe(&mut self, id: u64, update: RecipeUpdate) -> Result<(), PantryError> {
        self.require_recipe(id)?;

        let title = match update.title {
            Some(title) if title.trim().is_empty() => {
                return Err(PantryError::MissingField("title"));
            }
            Some(title) => Some(title.trim().to_string()),
            None => None,
        };

        let ingredients = match update.ingredients {
            Some(lines) => {
                let label = title
                    .clone()
                    .unwrap_or_else(|| self.recipe(id).map(|r| r.title.clone()).unwrap_or_default());
                Some(self.resolve_recipe_ingredients(&label, lines))
            }
            None => None,
        };

        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PantryError::not_found("Recipe", id))?;
        if let Some(title) = title {
            recipe.title = title;
        }
        if let Some(description) = update.description {
            recipe.description = Some(description);
        }
        if let Some(category) = update.category {
            recipe.category = Some(category);
        }
        if let Some(cuisine) = update.cuisine {
            recipe.cuisine = Some(cuisine);
        }
        if let Some(meal_type) = update.meal_type {
            recipe.meal_type = Some(meal_type);
        }
        if let Some(is_vegan) = update.is_vegan {
            recipe.is_vegan = is_vegan;
        }
        if let Some(is_vegetarian) = update.is_vegetarian {
            recipe.is_vegetarian = is_vegetarian;
        }
        if let Some(directions) = update.directions {
            recipe.directions = Some(directions);
        }
        if let Some(ingredients) = ingredients {
            recipe.ingredients = ingredients;
        }
        tracing::info!(id, "recipe updated");
        Ok(())
    }

    /// Delete a recipe along with its favorite, ratings and collection
    /// entries. Meal plans keep their slot but lose the recipe.
    pub fn delete_recipe(&mut self, id: u64) -> Result<RecipeDeletion, PantryError> {
        self.require_recipe(id)?;
        self.recipes.retain(|r| r.id != id);

        let mut deletion = RecipeDeletion::default();

        let before = self.favorites.len();
        self.favorites.retain(|f| f.recipe_id != id);
        deletion.favorites_removed = before - self.favorites.len();

        let before = self.ratings.len();
        self.ratings.retain(|r| r.recipe_id != id);
        deletion.ratings_removed = before - self.ratings.len();

        for collection in &mut self.collections {
            let before = collection.items.len();
            collection.items.retain(|i| i.recipe_id != id);
            if collection.items.len() != before {
                deletion.collections_touched += 1;
            }
        }

        for plan in self.meal_plans.iter_mut().filter(|m| m.recipe_id == Some(id)) {
            plan.recipe_id = None;
            deletion.meal_plans_cleared += 1;
        }

        tracing::info!(
            id,
            meal_plans_cleared = deletion.meal_plans_cleared,
            "recipe deleted"
        );
        Ok(deletion)
    }
}

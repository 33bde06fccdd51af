//! Favorites and named recipe collections.

use crate::error::PantryError;
use crate::models::{CollectionItem, Favorite, RecipeCollection};
use crate::pantry::Pantry;
use crate::recipe::RecipeSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_COLLECTION_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct NewCollection {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectionUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionSummary {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub recipe_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionRecipe {
    pub recipe_id: u64,
    pub recipe_title: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionDetail {
    #[serde(flatten)]
    pub summary: CollectionSummary,
    pub recipes: Vec<CollectionRecipe>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkAddResult {
    pub added: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Membership {
    pub collection_id: u64,
    pub collection_name: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeCollections {
    pub recipe_id: u64,
    pub recipe_title: String,
    pub collections: Vec<Membership>,
}

fn validate_name(name: &str) -> Result<String, PantryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PantryError::MissingField("name"));
    }
    if name.chars().count() > MAX_COLLECTION_NAME_LEN {
        return Err(PantryError::Invalid(format!(
            "Collection name must be at most {MAX_COLLECTION_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

impl Pantry {
    pub fn is_favorite(&self, recipe_id: u64) -> bool {
        self.favorites.iter().any(|f| f.recipe_id == recipe_id)
    }

    pub fn add_favorite(&mut self, recipe_id: u64) -> Result<(), PantryError> {
        self.require_recipe(recipe_id)?;
        if self.is_favorite(recipe_id) {
            return Err(PantryError::Conflict(
                "Recipe already in favorites".to_string(),
            ));
        }
        self.favorites.push(Favorite {
            recipe_id,
            created_at: Utc::now(),
        });
        Ok(())
    }

    pub fn remove_favorite(&mut self, recipe_id: u64) -> Result<(), PantryError> {
        let before = self.favorites.len();
        self.favorites.retain(|f| f.recipe_id != recipe_id);
        if self.favorites.len() == before {
            return Err(PantryError::not_found("Favorite", recipe_id));
        }
        Ok(())
    }

    /// Favorite recipes, most recently favorited first.
    pub fn favorite_recipes(&self) -> Vec<RecipeSummary> {
        let mut favorites: Vec<&Favorite> = self.favorites.iter().rev().collect();
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        favorites
            .into_iter()
            .filter_map(|f| self.recipe(f.recipe_id))
            .map(|r| self.recipe_summary(r))
            .collect()
    }

    pub fn collection(&self, id: u64) -> Option<&RecipeCollection> {
        self.collections.iter().find(|c| c.id == id)
    }

    fn collection_mut(&mut self, id: u64) -> Result<&mut RecipeCollection, PantryError> {
        self.collections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PantryError::not_found("Collection", id))
    }

    fn name_taken(&self, name: &str, except: Option<u64>) -> bool {
        let wanted = name.to_lowercase();
        self.collections
            .iter()
            .any(|c| Some(c.id) != except && c.name.to_lowercase() == wanted)
    }

    pub fn create_collection(&mut self, new_collection: NewCollection) -> Result<u64, PantryError> {
        let name = validate_name(&new_collection.name)?;
        if self.name_taken(&name, None) {
            return Err(PantryError::Conflict(
                "Collection with this name already exists".to_string(),
            ));
        }

        let id = self.allocate_id();
        let now = Utc::now();
        self.collections.push(RecipeCollection {
            id,
            name,
            description: new_collection.description,
            is_public: new_collection.is_public,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        tracing::info!(id, "collection created");
        Ok(id)
    }

    pub fn update_collection(
        &mut self,
        id: u64,
        update: CollectionUpdate,
    ) -> Result<(), PantryError> {
        self.collection_mut(id)?;

        let name = match update.name {
            Some(name) => {
                let name = validate_name(&name)?;
                if self.name_taken(&name, Some(id)) {
                    return Err(PantryError::Conflict(
                        "Collection with this name already exists".to_string(),
                    ));
                }
                Some(name)
            }
            None => None,
        };

        let collection = self.collection_mut(id)?;
        if let Some(name) = name {
            collection.name = name;
        }
        if let Some(description) = update.description {
            collection.description = Some(description);
        }
        if let Some(is_public) = update.is_public {
            collection.is_public = is_public;
        }
        collection.updated_at = Utc::now();
        Ok(())
    }

    pub fn delete_collection(&mut self, id: u64) -> Result<(), PantryError> {
        let before = self.collections.len();
        self.collections.retain(|c| c.id != id);
        if self.collections.len() == before {
            return Err(PantryError::not_found("Collection", id));
        }
        tracing::info!(id, "collection deleted");
        Ok(())
    }

    fn collection_summary(&self, collection: &RecipeCollection) -> CollectionSummary {
        CollectionSummary {
            id: collection.id,
            name: collection.name.clone(),
            description: collection.description.clone(),
            is_public: collection.is_public,
            recipe_count: collection.items.len(),
            created_at: collection.created_at,
            updated_at: collection.updated_at,
        }
    }

    /// Every collection, newest first.
    pub fn collections_overview(&self) -> Vec<CollectionSummary> {
        let mut collections: Vec<&RecipeCollection> = self.collections.iter().collect();
        collections.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        collections
            .into_iter()
            .map(|c| self.collection_summary(c))
            .collect()
    }

    pub fn collection_detail(&self, id: u64) -> Option<CollectionDetail> {
        let collection = self.collection(id)?;
        let recipes = collection
            .items
            .iter()
            .filter_map(|item| {
                let recipe = self.recipe(item.recipe_id)?;
                Some(CollectionRecipe {
                    recipe_id: recipe.id,
                    recipe_title: recipe.title.clone(),
                    added_at: item.added_at,
                })
            })
            .collect();

        Some(CollectionDetail {
            summary: self.collection_summary(collection),
            recipes,
        })
    }

    pub fn add_to_collection(
        &mut self,
        collection_id: u64,
        recipe_id: u64,
    ) -> Result<(), PantryError> {
        self.collection_mut(collection_id)?;
        self.require_recipe(recipe_id)?;

        let collection = self.collection_mut(collection_id)?;
        if collection.items.iter().any(|i| i.recipe_id == recipe_id) {
            return Err(PantryError::Conflict(
                "Recipe already in this collection".to_string(),
            ));
        }
        let now = Utc::now();
        collection.items.push(CollectionItem {
            recipe_id,
            added_at: now,
        });
        collection.updated_at = now;
        Ok(())
    }

    /// Add several recipes at once. Recipes already present are skipped and
    /// unknown ids are reported without stopping the rest.
    pub fn bulk_add_to_collection(
        &mut self,
        collection_id: u64,
        recipe_ids: &[u64],
    ) -> Result<BulkAddResult, PantryError> {
        self.collection_mut(collection_id)?;

        let mut result = BulkAddResult::default();
        for &recipe_id in recipe_ids {
            match self.add_to_collection(collection_id, recipe_id) {
                Ok(()) => result.added += 1,
                Err(PantryError::Conflict(_)) => result.skipped += 1,
                Err(_) => result.errors.push(format!("Recipe {recipe_id} not found")),
            }
        }
        tracing::info!(
            collection_id,
            added = result.added,
            skipped = result.skipped,
            "bulk add to collection"
        );
        Ok(result)
    }

    pub fn remove_from_collection(
        &mut self,
        collection_id: u64,
        recipe_id: u64,
    ) -> Result<(), PantryError> {
        let collection = self.collection_mut(collection_id)?;
        let before = collection.items.len();
        collection.items.retain(|i| i.recipe_id != recipe_id);
        if collection.items.len() == before {
            return Err(PantryError::not_found("Recipe in collection", recipe_id));
        }
        collection.updated_at = Utc::now();
        Ok(())
    }

    pub fn in_collections_count(&self, recipe_id: u64) -> usize {
        self.collections
            .iter()
            .filter(|c| c.items.iter().any(|i| i.recipe_id == recipe_id))
            .count()
    }

    /// The collections a recipe belongs to.
    pub fn recipe_collections(&self, recipe_id: u64) -> Result<RecipeCollections, PantryError> {
        let recipe = self.require_recipe(recipe_id)?;
        let collections = self
            .collections
            .iter()
            .filter_map(|c| {
                let item = c.items.iter().find(|i| i.recipe_id == recipe_id)?;
                Some(Membership {
                    collection_id: c.id,
                    collection_name: c.name.clone(),
                    added_at: item.added_at,
                })
            })
            .collect();

        Ok(RecipeCollections {
            recipe_id,
            recipe_title: recipe.title.clone(),
            collections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pantry::test_support::recipe;

    fn named(name: &str) -> NewCollection {
        NewCollection {
            name: name.to_string(),
            description: None,
            is_public: false,
        }
    }

    #[test]
    fn test_favorites() {
        let mut pantry = Pantry::new();
        let soup = pantry.add_recipe(recipe("Soup", vec![])).unwrap();
        let stew = pantry.add_recipe(recipe("Stew", vec![])).unwrap();

        pantry.add_favorite(soup).unwrap();
        pantry.add_favorite(stew).unwrap();
        assert_eq!(
            pantry.add_favorite(soup),
            Err(PantryError::Conflict("Recipe already in favorites".to_string()))
        );
        assert_eq!(
            pantry.add_favorite(999),
            Err(PantryError::not_found("Recipe", 999))
        );
        assert!(pantry.is_favorite(soup));

        let listed: Vec<u64> = pantry.favorite_recipes().iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![stew, soup]);
        assert!(pantry.favorite_recipes().iter().all(|r| r.is_favorite));

        pantry.remove_favorite(soup).unwrap();
        assert!(!pantry.is_favorite(soup));
        assert_eq!(
            pantry.remove_favorite(soup),
            Err(PantryError::not_found("Favorite", soup))
        );
    }

    #[test]
    fn test_create_collection_validates_name() {
        let mut pantry = Pantry::new();
        let id = pantry.create_collection(named("  Weeknight  ")).unwrap();
        assert_eq!(pantry.collection(id).unwrap().name, "Weeknight");

        assert_eq!(
            pantry.create_collection(named("weeknight")),
            Err(PantryError::Conflict(
                "Collection with this name already exists".to_string()
            ))
        );
        assert_eq!(
            pantry.create_collection(named("  ")),
            Err(PantryError::MissingField("name"))
        );
        assert!(pantry.create_collection(named(&"x".repeat(101))).is_err());
        assert!(pantry.create_collection(named(&"x".repeat(100))).is_ok());
    }

    #[test]
    fn test_update_and_delete_collection() {
        let mut pantry = Pantry::new();
        let a = pantry.create_collection(named("Soups")).unwrap();
        let b = pantry.create_collection(named("Stews")).unwrap();

        let rename = |name: &str| CollectionUpdate {
            name: Some(name.to_string()),
            ..Default::default()
        };
        assert!(matches!(
            pantry.update_collection(b, rename("SOUPS")),
            Err(PantryError::Conflict(_))
        ));
        // Renaming to its own name in another case is allowed
        pantry.update_collection(a, rename("SOUPS")).unwrap();
        pantry
            .update_collection(
                a,
                CollectionUpdate {
                    description: Some("Warm".to_string()),
                    is_public: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let soups = pantry.collection(a).unwrap();
        assert_eq!(soups.name, "SOUPS");
        assert_eq!(soups.description.as_deref(), Some("Warm"));
        assert!(soups.is_public);

        pantry.delete_collection(a).unwrap();
        assert_eq!(
            pantry.delete_collection(a),
            Err(PantryError::not_found("Collection", a))
        );
        assert!(pantry
            .update_collection(a, CollectionUpdate::default())
            .is_err());
    }

    #[test]
    fn test_collection_membership() {
        let mut pantry = Pantry::new();
        let soup = pantry.add_recipe(recipe("Soup", vec![])).unwrap();
        let stew = pantry.add_recipe(recipe("Stew", vec![])).unwrap();
        let winter = pantry.create_collection(named("Winter")).unwrap();
        let quick = pantry.create_collection(named("Quick")).unwrap();

        pantry.add_to_collection(winter, soup).unwrap();
        assert!(matches!(
            pantry.add_to_collection(winter, soup),
            Err(PantryError::Conflict(_))
        ));
        assert_eq!(
            pantry.add_to_collection(winter, 999),
            Err(PantryError::not_found("Recipe", 999))
        );

        let bulk = pantry
            .bulk_add_to_collection(winter, &[soup, stew, 999])
            .unwrap();
        assert_eq!(
            bulk,
            BulkAddResult {
                added: 1,
                skipped: 1,
                errors: vec!["Recipe 999 not found".to_string()],
            }
        );
        assert!(pantry.bulk_add_to_collection(12345, &[soup]).is_err());

        pantry.add_to_collection(quick, soup).unwrap();
        assert_eq!(pantry.in_collections_count(soup), 2);

        let detail = pantry.collection_detail(winter).unwrap();
        assert_eq!(detail.summary.recipe_count, 2);
        let titles: Vec<&str> = detail.recipes.iter().map(|r| r.recipe_title.as_str()).collect();
        assert_eq!(titles, vec!["Soup", "Stew"]);

        let memberships = pantry.recipe_collections(soup).unwrap();
        assert_eq!(memberships.recipe_title, "Soup");
        assert_eq!(memberships.collections.len(), 2);

        let overview = pantry.collections_overview();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].id, quick);

        pantry.remove_from_collection(winter, soup).unwrap();
        assert!(pantry.remove_from_collection(winter, soup).is_err());
        assert_eq!(pantry.in_collections_count(soup), 1);
    }

    #[test]
    fn test_collection_detail_json_is_flat() {
        let mut pantry = Pantry::new();
        let id = pantry.create_collection(named("Winter")).unwrap();
        let json = serde_json::to_value(pantry.collection_detail(id).unwrap()).unwrap();
        assert_eq!(json["name"], "Winter");
        assert_eq!(json["recipe_count"], 0);
        assert_eq!(json["recipes"], serde_json::json!([]));
    }
}

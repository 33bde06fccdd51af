//! Shopping list: manual entries, entries generated from recipes and meal
//! plans, and moving purchased items into the fridge.

use crate::amount::{format_amount, parse_optional_amount};
use crate::error::PantryError;
use crate::models::{ShoppingItem, ShoppingSource};
use crate::pantry::{IngredientRef, Pantry, UpsertAction};
use crate::units::{convert_unit, format_quantity_with_conversions, unit_group, Alternative};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientInfo {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingListEntry {
    pub id: u64,
    pub ingredient: Option<IngredientInfo>,
    pub amount: Option<f64>,
    /// The stored amount, kept only when it is not a number ("a handful").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_text: Option<String>,
    pub unit: Option<String>,
    pub alternatives: Vec<Alternative>,
    pub is_purchased: bool,
    pub source_type: ShoppingSource,
    pub source_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingListView {
    pub items: Vec<ShoppingListEntry>,
    pub total_items: usize,
    pub purchased_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingUpsert {
    pub action: UpsertAction,
    pub item_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddedCounts {
    pub added: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MealPlanShopping {
    pub added: usize,
    pub meal_plans_processed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferSummary {
    pub transferred_count: usize,
    pub updated_count: usize,
    pub total_processed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub id: u64,
    pub ingredient: Option<IngredientInfo>,
    pub needed_amount: Option<f64>,
    /// The stored amount, kept only when it is not a number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_text: Option<String>,
    pub in_fridge: Option<f64>,
    pub available_in_fridge: bool,
    pub is_purchased: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FridgeComparison {
    pub comparison: Vec<ComparisonEntry>,
    pub total_items: usize,
    pub items_in_fridge: usize,
}

impl Pantry {
    pub fn shopping_item(&self, id: u64) -> Option<&ShoppingItem> {
        self.shopping_list.iter().find(|s| s.id == id)
    }

    fn shopping_item_mut(&mut self, id: u64) -> Result<&mut ShoppingItem, PantryError> {
        self.shopping_list
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PantryError::not_found("Shopping list item", id))
    }

    fn is_on_shopping_list(&self, ingredient_id: u64) -> bool {
        self.shopping_list
            .iter()
            .any(|s| s.ingredient_id == Some(ingredient_id))
    }

    fn ingredient_info(&self, ingredient_id: Option<u64>) -> Option<IngredientInfo> {
        let ingredient = self.ingredient(ingredient_id?)?;
        Some(IngredientInfo {
            id: ingredient.id,
            name: ingredient.name.clone(),
        })
    }

    /// The item's own unit, or its ingredient's default unit.
    fn shopping_unit(&self, item: &ShoppingItem) -> Option<String> {
        item.unit.clone().or_else(|| {
            item.ingredient_id
                .and_then(|id| self.ingredient(id))
                .and_then(|i| i.default_unit.clone())
        })
    }

    fn push_shopping_item(
        &mut self,
        ingredient_id: u64,
        amount: Option<String>,
        unit: Option<String>,
        source_type: ShoppingSource,
        source_id: Option<u64>,
    ) -> u64 {
        let id = self.allocate_id();
        self.shopping_list.push(ShoppingItem {
            id,
            ingredient_id: Some(ingredient_id),
            amount,
            unit,
            is_purchased: false,
            source_type,
            source_id,
            created_at: Utc::now(),
        });
        id
    }

    /// Unpurchased items first, newest first within each group.
    pub fn shopping_view(&self) -> ShoppingListView {
        let mut ordered: Vec<&ShoppingItem> = self.shopping_list.iter().collect();
        ordered.sort_by(|a, b| {
            a.is_purchased
                .cmp(&b.is_purchased)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });

        let items: Vec<ShoppingListEntry> = ordered
            .into_iter()
            .map(|item| {
                let unit = self.shopping_unit(item);
                let (amount, amount_text) = split_amount(item.amount.as_deref());
                let formatted = format_quantity_with_conversions(amount, unit.as_deref(), true);

                ShoppingListEntry {
                    id: item.id,
                    ingredient: self.ingredient_info(item.ingredient_id),
                    amount: formatted.quantity,
                    amount_text,
                    unit: formatted.unit,
                    alternatives: formatted.alternatives,
                    is_purchased: item.is_purchased,
                    source_type: item.source_type,
                    source_id: item.source_id,
                    created_at: item.created_at,
                }
            })
            .collect();

        ShoppingListView {
            total_items: items.len(),
            purchased_count: items.iter().filter(|i| i.is_purchased).count(),
            items,
        }
    }

    /// Add an ingredient by hand. If it is already on the list its amount is
    /// replaced and it goes back to unpurchased.
    pub fn add_shopping_item(
        &mut self,
        ingredient: &IngredientRef,
        amount: Option<String>,
    ) -> Result<ShoppingUpsert, PantryError> {
        let ingredient_id = match self.resolve_ingredient(ingredient) {
            Some(found) => found.id,
            None => {
                let id = match ingredient {
                    IngredientRef::Id(id) => id.to_string(),
                    IngredientRef::Name(name) => name.clone(),
                };
                return Err(PantryError::not_found("Ingredient", id));
            }
        };

        if let Some(existing) = self
            .shopping_list
            .iter_mut()
            .find(|s| s.ingredient_id == Some(ingredient_id))
        {
            existing.amount = amount;
            existing.is_purchased = false;
            return Ok(ShoppingUpsert {
                action: UpsertAction::Updated,
                item_id: existing.id,
            });
        }

        let item_id =
            self.push_shopping_item(ingredient_id, amount, None, ShoppingSource::Manual, None);
        Ok(ShoppingUpsert {
            action: UpsertAction::Created,
            item_id,
        })
    }

    /// Add every ingredient of a recipe. Ingredients already on the list are
    /// counted as updated and left alone.
    pub fn add_recipe_to_shopping_list(
        &mut self,
        recipe_id: u64,
    ) -> Result<AddedCounts, PantryError> {
        let ingredients = self.require_recipe(recipe_id)?.ingredients.clone();

        let mut counts = AddedCounts {
            added: 0,
            updated: 0,
        };
        for ri in ingredients {
            if self.is_on_shopping_list(ri.ingredient_id) {
                counts.updated += 1;
                continue;
            }
            self.push_shopping_item(
                ri.ingredient_id,
                ri.quantity.map(format_amount),
                ri.unit,
                ShoppingSource::Recipe,
                Some(recipe_id),
            );
            counts.added += 1;
        }

        tracing::info!(recipe_id, added = counts.added, "shopping list updated from recipe");
        Ok(counts)
    }

    /// Add the ingredients of every planned recipe between `start` and `end`
    /// (inclusive) that are not on the list yet.
    pub fn add_meal_plan_to_shopping_list(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> MealPlanShopping {
        let planned: Vec<(u64, u64)> = self
            .meal_plans
            .iter()
            .filter(|mp| mp.plan_date >= start && mp.plan_date <= end)
            .filter_map(|mp| mp.recipe_id.map(|recipe_id| (mp.id, recipe_id)))
            .collect();

        let mut added = 0;
        for (meal_plan_id, recipe_id) in &planned {
            let Some(recipe) = self.recipe(*recipe_id) else {
                tracing::warn!(meal_plan_id, recipe_id, "meal plan points at a missing recipe");
                continue;
            };
            for ri in recipe.ingredients.clone() {
                if self.is_on_shopping_list(ri.ingredient_id) {
                    continue;
                }
                self.push_shopping_item(
                    ri.ingredient_id,
                    ri.quantity.map(format_amount),
                    ri.unit,
                    ShoppingSource::MealPlan,
                    Some(*meal_plan_id),
                );
                added += 1;
            }
        }

        MealPlanShopping {
            added,
            meal_plans_processed: planned.len(),
        }
    }

    pub fn toggle_purchased(&mut self, id: u64) -> Result<bool, PantryError> {
        let item = self.shopping_item_mut(id)?;
        item.is_purchased = !item.is_purchased;
        Ok(item.is_purchased)
    }

    pub fn update_shopping_item(
        &mut self,
        id: u64,
        amount: Option<f64>,
        is_purchased: Option<bool>,
    ) -> Result<(), PantryError> {
        let item = self.shopping_item_mut(id)?;
        if let Some(amount) = amount {
            item.amount = Some(format_amount(amount));
        }
        if let Some(is_purchased) = is_purchased {
            item.is_purchased = is_purchased;
        }
        Ok(())
    }

    pub fn remove_shopping_item(&mut self, id: u64) -> Result<(), PantryError> {
        let before = self.shopping_list.len();
        self.shopping_list.retain(|s| s.id != id);
        if self.shopping_list.len() == before {
            return Err(PantryError::not_found("Shopping list item", id));
        }
        Ok(())
    }

    /// Remove the given items, ignoring ids that are not on the list.
    pub fn bulk_remove_shopping_items(&mut self, ids: &[u64]) -> usize {
        let before = self.shopping_list.len();
        self.shopping_list.retain(|s| !ids.contains(&s.id));
        before - self.shopping_list.len()
    }

    pub fn clear_shopping_list(&mut self, purchased_only: bool) -> usize {
        let before = self.shopping_list.len();
        if purchased_only {
            self.shopping_list.retain(|s| !s.is_purchased);
        } else {
            self.shopping_list.clear();
        }
        before - self.shopping_list.len()
    }

    /// Move purchased items into the fridge.
    ///
    /// Stock already in the fridge is topped up, converting the purchased
    /// amount into the fridge's unit when both units share a group. Items
    /// without an ingredient stay on the list.
    pub fn transfer_purchased_to_fridge(&mut self) -> TransferSummary {
        let purchased: Vec<(ShoppingItem, Option<String>)> = self
            .shopping_list
            .iter()
            .filter(|s| s.is_purchased && s.ingredient_id.is_some())
            .map(|s| (s.clone(), self.shopping_unit(s)))
            .collect();

        let mut summary = TransferSummary {
            transferred_count: 0,
            updated_count: 0,
            total_processed: 0,
        };

        for (item, shop_unit) in &purchased {
            let Some(ingredient_id) = item.ingredient_id else {
                continue;
            };
            let parsed = parse_optional_amount(item.amount.as_deref());

            match self
                .fridge
                .iter_mut()
                .find(|f| f.ingredient_id == ingredient_id)
            {
                Some(stock) => {
                    let mut amount = parsed.unwrap_or(0.0);
                    let same_group = unit_group(shop_unit.as_deref())
                        .is_some_and(|g| Some(g) == unit_group(stock.unit.as_deref()));
                    if same_group {
                        if let Some(converted) = convert_unit(
                            Some(amount),
                            shop_unit.as_deref(),
                            stock.unit.as_deref(),
                        )
                        .filter(|q| *q != 0.0)
                        {
                            amount = converted;
                        }
                    }
                    stock.quantity = Some(stock.quantity.unwrap_or(0.0) + amount);
                    summary.updated_count += 1;
                }
                None => {
                    let id = self.allocate_id();
                    self.fridge.push(crate::models::FridgeItem {
                        id,
                        ingredient_id,
                        quantity: parsed,
                        unit: shop_unit.clone(),
                        added_at: Utc::now(),
                    });
                    summary.transferred_count += 1;
                }
            }
        }

        let moved: Vec<u64> = purchased.iter().map(|(item, _)| item.id).collect();
        self.shopping_list.retain(|s| !moved.contains(&s.id));

        summary.total_processed = summary.transferred_count + summary.updated_count;
        tracing::info!(
            transferred = summary.transferred_count,
            updated = summary.updated_count,
            "purchased items moved to fridge"
        );
        summary
    }

    /// Line up unpurchased items against fridge stock.
    pub fn compare_with_fridge(&self) -> FridgeComparison {
        let comparison: Vec<ComparisonEntry> = self
            .shopping_list
            .iter()
            .filter(|s| !s.is_purchased)
            .map(|item| {
                let stock = item.ingredient_id.and_then(|id| self.fridge_item_for(id));
                let (needed_amount, amount_text) = split_amount(item.amount.as_deref());
                ComparisonEntry {
                    id: item.id,
                    ingredient: self.ingredient_info(item.ingredient_id),
                    needed_amount,
                    amount_text,
                    in_fridge: stock.and_then(|f| f.quantity),
                    available_in_fridge: stock.is_some(),
                    is_purchased: item.is_purchased,
                }
            })
            .collect();

        FridgeComparison {
            total_items: comparison.len(),
            items_in_fridge: comparison.iter().filter(|c| c.available_in_fridge).count(),
            comparison,
        }
    }
}

/// Split a stored amount into its numeric value or, failing that, its text.
fn split_amount(stored: Option<&str>) -> (Option<f64>, Option<String>) {
    match parse_optional_amount(stored) {
        Some(amount) => (Some(amount), None),
        None => (
            None,
            stored.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string),
        ),
    }
}

//! Fridge inventory: one stock entry per ingredient.

use crate::error::PantryError;
use crate::models::{FridgeItem, Ingredient};
use crate::pantry::{Pantry, UpsertAction};
use crate::units::{format_quantity_with_conversions, Alternative};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FridgeUpsert {
    pub action: UpsertAction,
    pub id: u64,
    pub ingredient: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FridgeItemDetail {
    pub id: u64,
    pub ingredient: Option<Ingredient>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub alternatives: Vec<Alternative>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FridgeView {
    pub items: Vec<FridgeItemDetail>,
    pub total: usize,
}

impl Pantry {
    pub fn fridge_item(&self, id: u64) -> Option<&FridgeItem> {
        self.fridge.iter().find(|f| f.id == id)
    }

    pub(crate) fn fridge_item_for(&self, ingredient_id: u64) -> Option<&FridgeItem> {
        self.fridge.iter().find(|f| f.ingredient_id == ingredient_id)
    }

    /// Put `quantity` of `name` in the fridge.
    ///
    /// An existing entry for the ingredient has its quantity and unit replaced
    /// rather than summed; unknown ingredients are created on the fly.
    pub fn upsert_fridge_item(
        &mut self,
        name: &str,
        quantity: Option<f64>,
        unit: Option<&str>,
    ) -> Result<FridgeUpsert, PantryError> {
        if name.trim().is_empty() {
            return Err(PantryError::MissingField("ingredient_name"));
        }
        let Some(quantity) = quantity.filter(|q| q.is_finite() && *q != 0.0) else {
            return Err(PantryError::MissingField("quantity"));
        };

        let ingredient_id = self.find_or_create_ingredient(name, unit);
        let ingredient = self.ingredient_name(ingredient_id);
        let unit = unit.map(str::to_string);

        if let Some(existing) = self
            .fridge
            .iter_mut()
            .find(|f| f.ingredient_id == ingredient_id)
        {
            existing.quantity = Some(quantity);
            existing.unit = unit;
            tracing::debug!(id = existing.id, ingredient = %ingredient, "fridge item updated");
            return Ok(FridgeUpsert {
                action: UpsertAction::Updated,
                id: existing.id,
                ingredient,
            });
        }

        let id = self.allocate_id();
        self.fridge.push(FridgeItem {
            id,
            ingredient_id,
            quantity: Some(quantity),
            unit,
            added_at: Utc::now(),
        });
        tracing::debug!(id, ingredient = %ingredient, "fridge item created");

        Ok(FridgeUpsert {
            action: UpsertAction::Created,
            id,
            ingredient,
        })
    }

    pub fn remove_fridge_item(&mut self, id: u64) -> Result<(), PantryError> {
        let before = self.fridge.len();
        self.fridge.retain(|f| f.id != id);
        if self.fridge.len() == before {
            return Err(PantryError::not_found("Fridge item", id));
        }
        Ok(())
    }

    pub fn fridge_view(&self, include_conversions: bool) -> FridgeView {
        let items: Vec<FridgeItemDetail> = self
            .fridge
            .iter()
            .map(|item| {
                let formatted = format_quantity_with_conversions(
                    item.quantity,
                    item.unit.as_deref(),
                    include_conversions,
                );
                FridgeItemDetail {
                    id: item.id,
                    ingredient: self.ingredient(item.ingredient_id).cloned(),
                    quantity: formatted.quantity,
                    unit: formatted.unit,
                    alternatives: formatted.alternatives,
                    added_at: item.added_at,
                }
            })
            .collect();

        FridgeView {
            total: items.len(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_creates_then_replaces() {
        let mut pantry = Pantry::new();

        let created = pantry
            .upsert_fridge_item("Milk", Some(2.0), Some("cup"))
            .unwrap();
        assert_eq!(created.action, UpsertAction::Created);
        assert_eq!(created.ingredient, "milk");

        let updated = pantry
            .upsert_fridge_item("milk", Some(1.0), Some("tablespoon"))
            .unwrap();
        assert_eq!(updated.action, UpsertAction::Updated);
        assert_eq!(updated.id, created.id);

        let item = pantry.fridge_item(created.id).unwrap();
        assert_eq!(item.quantity, Some(1.0));
        assert_eq!(item.unit.as_deref(), Some("tablespoon"));
        assert_eq!(pantry.fridge.len(), 1);
    }

    #[test]
    fn test_upsert_requires_name_and_quantity() {
        let mut pantry = Pantry::new();
        assert_eq!(
            pantry.upsert_fridge_item("", Some(1.0), None),
            Err(PantryError::MissingField("ingredient_name"))
        );
        assert_eq!(
            pantry.upsert_fridge_item("eggs", None, Some("piece")),
            Err(PantryError::MissingField("quantity"))
        );
        assert_eq!(
            pantry.upsert_fridge_item("eggs", Some(0.0), Some("piece")),
            Err(PantryError::MissingField("quantity"))
        );
        assert!(pantry.fridge.is_empty());
    }

    #[test]
    fn test_remove_fridge_item() {
        let mut pantry = Pantry::new();
        let created = pantry.upsert_fridge_item("rice", Some(500.0), Some("gram")).unwrap();
        assert!(pantry.remove_fridge_item(created.id).is_ok());
        assert_eq!(
            pantry.remove_fridge_item(created.id),
            Err(PantryError::not_found("Fridge item", created.id))
        );
    }

    #[test]
    fn test_fridge_view_includes_alternatives() {
        let mut pantry = Pantry::new();
        pantry.upsert_fridge_item("sugar", Some(3.0), Some("tablespoon")).unwrap();
        pantry.upsert_fridge_item("eggs", Some(6.0), Some("piece")).unwrap();

        let view = pantry.fridge_view(true);
        assert_eq!(view.total, 2);

        let sugar = &view.items[0];
        assert_eq!(sugar.ingredient.as_ref().map(|i| i.name.as_str()), Some("sugar"));
        assert_eq!(sugar.quantity, Some(0.19));
        assert_eq!(sugar.unit.as_deref(), Some("cup"));
        assert!(!sugar.alternatives.is_empty());

        let eggs = &view.items[1];
        assert_eq!(eggs.quantity, Some(6.0));
        assert!(eggs.alternatives.is_empty());

        let plain = pantry.fridge_view(false);
        assert_eq!(plain.items[0].quantity, Some(3.0));
        assert_eq!(plain.items[0].unit.as_deref(), Some("tablespoon"));
    }
}

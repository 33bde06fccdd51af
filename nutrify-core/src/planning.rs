//! Weekly meal planning and the "what do I still need" report.

use crate::error::{PantryError, PlanningError};
use crate::models::{MealPlan, MealType};
use crate::pantry::{Pantry, UpsertAction};
use crate::units::{convert_unit, primary_unit, unit_group};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit assumed for recipe ingredients that do not name one.
const DEFAULT_COUNT_UNIT: &str = "piece";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanUpsert {
    pub action: UpsertAction,
    pub meal_plan_id: u64,
}

/// Fields to change on an existing meal plan. `recipe_id: Some(None)` clears
/// the recipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MealPlanUpdate {
    pub recipe_id: Option<Option<u64>>,
    pub plan_date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRecipe {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedSlot {
    pub id: u64,
    pub recipe: Option<PlannedRecipe>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayMeals {
    pub breakfast: Option<PlannedSlot>,
    pub lunch: Option<PlannedSlot>,
    pub dinner: Option<PlannedSlot>,
    pub snack: Option<PlannedSlot>,
}

impl DayMeals {
    fn slot_mut(&mut self, meal_type: MealType) -> &mut Option<PlannedSlot> {
        match meal_type {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snack,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    pub date: NaiveDate,
    pub day_name: &'static str,
    pub meals: DayMeals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyPlan {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<DayPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearedWeek {
    pub deleted_count: usize,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeededQuantity {
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingIngredient {
    pub ingredient_id: u64,
    pub name: String,
    pub needed_total: Option<f64>,
    pub needed_unit: Option<String>,
    pub needed_breakdown: Vec<NeededQuantity>,
    pub in_fridge: Option<f64>,
    pub fridge_unit: Option<String>,
    pub is_available: bool,
    pub is_sufficient: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingIngredientsReport {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub missing_ingredients: Vec<MissingIngredient>,
    pub total_ingredients: usize,
    pub available_count: usize,
    pub unavailable_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningStats {
    pub total_plans: usize,
    pub plans_with_recipes: usize,
    pub current_week_plans: usize,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub meal_type_distribution: BTreeMap<MealType, usize>,
}

/// One entry of a bulk import file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlannedMeal {
    pub plan_date: String,
    pub meal_type: MealType,
    #[serde(default)]
    pub recipe_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkImportSummary {
    pub added: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

/// Parse a plan date given as `YYYY-MM-DD` or as a timestamp.
///
/// Timestamps keep the calendar date of their own offset, so
/// `2026-10-19T23:30:00-05:00` is the 19th. Dates too close to the end of
/// the calendar to start a full week are rejected.
pub fn parse_plan_date(input: &str) -> Result<NaiveDate, PlanningError> {
    parse_date_text(input.trim())
        .filter(|date| week_end(*date).is_ok())
        .ok_or_else(|| PlanningError::InvalidDate(input.to_string()))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|timestamp| timestamp.date())
}

/// Last day of the seven-day week starting at `start`.
pub fn week_end(start: NaiveDate) -> Result<NaiveDate, PlanningError> {
    start
        .checked_add_days(Days::new(6))
        .ok_or(PlanningError::OutOfRange(start))
}

/// The seven-day window starting at `start`, or at the Monday of `today`'s
/// week when no start is given.
pub fn week_bounds(
    start: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), PlanningError> {
    let start = match start {
        Some(start) => start,
        None => today
            .checked_sub_days(Days::new(u64::from(
                today.weekday().num_days_from_monday(),
            )))
            .ok_or(PlanningError::OutOfRange(today))?,
    };
    Ok((start, week_end(start)?))
}

fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Pantry {
    pub fn meal_plan(&self, id: u64) -> Option<&MealPlan> {
        self.meal_plans.iter().find(|mp| mp.id == id)
    }

    fn plans_between(&self, start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = &MealPlan> {
        self.meal_plans
            .iter()
            .filter(move |mp| mp.plan_date >= start && mp.plan_date <= end)
    }

    fn check_recipe(&self, recipe_id: Option<u64>) -> Result<(), PantryError> {
        if let Some(id) = recipe_id {
            self.require_recipe(id)?;
        }
        Ok(())
    }

    /// Point the `(date, meal_type)` slot at a recipe, creating the slot if
    /// it is empty.
    pub fn plan_meal(
        &mut self,
        plan_date: NaiveDate,
        meal_type: MealType,
        recipe_id: Option<u64>,
    ) -> Result<PlanUpsert, PantryError> {
        self.check_recipe(recipe_id)?;

        if let Some(existing) = self
            .meal_plans
            .iter_mut()
            .find(|mp| mp.plan_date == plan_date && mp.meal_type == meal_type)
        {
            existing.recipe_id = recipe_id;
            return Ok(PlanUpsert {
                action: UpsertAction::Updated,
                meal_plan_id: existing.id,
            });
        }

        let id = self.allocate_id();
        self.meal_plans.push(MealPlan {
            id,
            plan_date,
            meal_type,
            recipe_id,
        });
        tracing::debug!(id, date = %plan_date, meal_type = meal_type.as_str(), "meal planned");

        Ok(PlanUpsert {
            action: UpsertAction::Created,
            meal_plan_id: id,
        })
    }

    pub fn update_meal_plan(&mut self, id: u64, update: MealPlanUpdate) -> Result<(), PantryError> {
        let current = self
            .meal_plan(id)
            .ok_or_else(|| PantryError::not_found("Meal plan", id))?;
        if let Some(recipe_id) = update.recipe_id {
            self.check_recipe(recipe_id)?;
        }

        let plan_date = update.plan_date.unwrap_or(current.plan_date);
        let meal_type = update.meal_type.unwrap_or(current.meal_type);
        let taken = self
            .meal_plans
            .iter()
            .any(|mp| mp.id != id && mp.plan_date == plan_date && mp.meal_type == meal_type);
        if taken {
            return Err(PlanningError::SlotTaken {
                date: plan_date,
                meal_type,
            }
            .into());
        }

        let plan = self
            .meal_plans
            .iter_mut()
            .find(|mp| mp.id == id)
            .ok_or_else(|| PantryError::not_found("Meal plan", id))?;
        plan.plan_date = plan_date;
        plan.meal_type = meal_type;
        if let Some(recipe_id) = update.recipe_id {
            plan.recipe_id = recipe_id;
        }
        Ok(())
    }

    pub fn remove_meal_plan(&mut self, id: u64) -> Result<(), PantryError> {
        let before = self.meal_plans.len();
        self.meal_plans.retain(|mp| mp.id != id);
        if self.meal_plans.len() == before {
            return Err(PantryError::not_found("Meal plan", id));
        }
        Ok(())
    }

    /// Drop every plan in the week starting at `start`.
    pub fn clear_week(&mut self, start: NaiveDate) -> Result<ClearedWeek, PlanningError> {
        let end = week_end(start)?;
        let before = self.meal_plans.len();
        self.meal_plans
            .retain(|mp| mp.plan_date < start || mp.plan_date > end);

        Ok(ClearedWeek {
            deleted_count: before - self.meal_plans.len(),
            week_start: start,
            week_end: end,
        })
    }

    /// Plan many meals at once. Entries with a bad date or an unknown recipe
    /// are reported and skipped; the rest are applied.
    pub fn bulk_import_meals(&mut self, meals: &[PlannedMeal]) -> BulkImportSummary {
        let mut summary = BulkImportSummary {
            added: 0,
            updated: 0,
            errors: Vec::new(),
        };

        for meal in meals {
            let Ok(plan_date) = parse_plan_date(&meal.plan_date) else {
                summary
                    .errors
                    .push(format!("Invalid date format: {}", meal.plan_date));
                continue;
            };
            match self.plan_meal(plan_date, meal.meal_type, meal.recipe_id) {
                Ok(PlanUpsert {
                    action: UpsertAction::Created,
                    ..
                }) => summary.added += 1,
                Ok(PlanUpsert {
                    action: UpsertAction::Updated,
                    ..
                }) => summary.updated += 1,
                Err(err) => summary.errors.push(err.to_string()),
            }
        }

        summary
    }

    pub fn weekly_plan(&self, start: NaiveDate) -> Result<WeeklyPlan, PlanningError> {
        let end = week_end(start)?;

        let mut days: Vec<DayPlan> = (0..7)
            .filter_map(|offset| start.checked_add_days(Days::new(offset)))
            .map(|date| DayPlan {
                date,
                day_name: day_name(date),
                meals: DayMeals::default(),
            })
            .collect();

        for mp in self.plans_between(start, end) {
            let Ok(offset) = usize::try_from((mp.plan_date - start).num_days()) else {
                continue;
            };
            let Some(day) = days.get_mut(offset) else {
                continue;
            };
            let recipe = mp.recipe_id.and_then(|id| self.recipe(id)).map(|r| PlannedRecipe {
                id: r.id,
                title: r.title.clone(),
            });
            *day.meals.slot_mut(mp.meal_type) = Some(PlannedSlot { id: mp.id, recipe });
        }

        Ok(WeeklyPlan {
            week_start: start,
            week_end: end,
            days,
        })
    }

    /// Everything the week's recipes call for, checked against the fridge.
    ///
    /// Quantities are summed per ingredient and per unit, then each unit is
    /// normalized to its group's primary unit. Ingredients the fridge cannot
    /// cover sort first.
    pub fn missing_ingredients(
        &self,
        start: NaiveDate,
    ) -> Result<MissingIngredientsReport, PlanningError> {
        let end = week_end(start)?;

        // (ingredient id, name, per-unit totals in first-seen order)
        let mut needed: Vec<(u64, String, Vec<(String, f64)>)> = Vec::new();

        for mp in self.plans_between(start, end) {
            let Some(recipe) = mp.recipe_id.and_then(|id| self.recipe(id)) else {
                continue;
            };
            for ri in &recipe.ingredients {
                let index = match needed.iter().position(|(id, _, _)| *id == ri.ingredient_id) {
                    Some(index) => index,
                    None => {
                        needed.push((
                            ri.ingredient_id,
                            self.ingredient_name(ri.ingredient_id),
                            Vec::new(),
                        ));
                        needed.len() - 1
                    }
                };

                let unit = ri
                    .unit
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .unwrap_or(DEFAULT_COUNT_UNIT);
                let quantity = ri.quantity.filter(|q| q.is_finite()).unwrap_or(0.0);

                let totals = &mut needed[index].2;
                match totals.iter_mut().find(|(u, _)| u == unit) {
                    Some((_, total)) => *total += quantity,
                    None => totals.push((unit.to_string(), quantity)),
                }
            }
        }

        let mut missing: Vec<MissingIngredient> = needed
            .into_iter()
            .map(|(ingredient_id, name, totals)| {
                self.missing_entry(ingredient_id, name, totals)
            })
            .collect();

        missing.sort_by(|a, b| {
            (a.is_sufficient, a.is_available, &a.name).cmp(&(
                b.is_sufficient,
                b.is_available,
                &b.name,
            ))
        });

        let available_count = missing.iter().filter(|m| m.is_available).count();
        Ok(MissingIngredientsReport {
            week_start: start,
            week_end: end,
            total_ingredients: missing.len(),
            available_count,
            unavailable_count: missing.len() - available_count,
            missing_ingredients: missing,
        })
    }

    fn missing_entry(
        &self,
        ingredient_id: u64,
        name: String,
        totals: Vec<(String, f64)>,
    ) -> MissingIngredient {
        let mut needed_unit: Option<String> = None;
        let mut needed_total = 0.0;
        let mut needed_breakdown = Vec::new();

        for (unit, quantity) in totals.into_iter().filter(|(_, q)| *q > 0.0) {
            if unit_group(Some(&unit)).is_some() {
                let primary = primary_unit(&unit);
                match convert_unit(Some(quantity), Some(&unit), Some(primary)).filter(|q| *q != 0.0)
                {
                    Some(converted) => {
                        needed_total += converted;
                        needed_unit = Some(primary.to_string());
                    }
                    None => {
                        needed_total += quantity;
                        needed_unit = Some(unit.clone());
                    }
                }
            } else {
                needed_total += quantity;
                needed_unit = Some(unit.clone());
            }

            needed_breakdown.push(NeededQuantity {
                quantity: round2(quantity),
                unit,
            });
        }

        let stock = self.fridge_item_for(ingredient_id);
        let mut in_fridge = None;
        let mut is_sufficient = false;

        if let Some(stock) = stock {
            let fridge_quantity = stock.quantity.unwrap_or(0.0);
            in_fridge = Some(fridge_quantity);

            if let (Some(target), Some(fridge_unit)) = (needed_unit.as_deref(), stock.unit.as_deref())
            {
                if let Some(converted) =
                    convert_unit(Some(fridge_quantity), Some(fridge_unit), Some(target))
                        .filter(|q| *q != 0.0)
                {
                    in_fridge = Some(round2(converted));
                    is_sufficient = converted >= needed_total;
                }
            }
        }

        MissingIngredient {
            ingredient_id,
            name,
            needed_total: (needed_total != 0.0).then(|| round2(needed_total)),
            needed_unit,
            needed_breakdown,
            in_fridge,
            fridge_unit: stock.and_then(|s| s.unit.clone()),
            is_available: stock.is_some(),
            is_sufficient,
        }
    }

    pub fn planning_stats(&self, today: NaiveDate) -> Result<PlanningStats, PlanningError> {
        let (week_start, week_end) = week_bounds(None, today)?;

        let mut meal_type_distribution = BTreeMap::new();
        for mp in &self.meal_plans {
            *meal_type_distribution.entry(mp.meal_type).or_insert(0) += 1;
        }

        Ok(PlanningStats {
            total_plans: self.meal_plans.len(),
            plans_with_recipes: self
                .meal_plans
                .iter()
                .filter(|mp| mp.recipe_id.is_some())
                .count(),
            current_week_plans: self.plans_between(week_start, week_end).count(),
            week_start,
            week_end,
            meal_type_distribution,
        })
    }
}

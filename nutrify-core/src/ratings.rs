//! Recipe ratings: one 1 to 5 score per recipe with an optional comment.

use crate::error::PantryError;
use crate::models::Rating;
use crate::pantry::{Pantry, UpsertAction};
use chrono::Utc;
use serde::Serialize;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Average score rounded to one decimal, `None` when nobody rated yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingsSummary {
    pub average: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeRatings {
    pub recipe_id: u64,
    pub ratings: Vec<Rating>,
    pub average: Option<f64>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSaved {
    pub rating_id: u64,
    pub action: UpsertAction,
}

impl Pantry {
    /// Rate a recipe, replacing any earlier score and comment.
    pub fn rate_recipe(
        &mut self,
        recipe_id: u64,
        score: u8,
        comment: Option<String>,
    ) -> Result<RatingSaved, PantryError> {
        self.require_recipe(recipe_id)?;
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(PantryError::Invalid(format!(
                "Score must be between {MIN_SCORE} and {MAX_SCORE}"
            )));
        }
        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let now = Utc::now();

        if let Some(existing) = self.ratings.iter_mut().find(|r| r.recipe_id == recipe_id) {
            existing.score = score;
            existing.comment = comment;
            existing.updated_at = now;
            return Ok(RatingSaved {
                rating_id: existing.id,
                action: UpsertAction::Updated,
            });
        }

        let id = self.allocate_id();
        self.ratings.push(Rating {
            id,
            recipe_id,
            score,
            comment,
            created_at: now,
            updated_at: now,
        });
        tracing::debug!(id, recipe_id, score, "recipe rated");
        Ok(RatingSaved {
            rating_id: id,
            action: UpsertAction::Created,
        })
    }

    pub fn remove_rating(&mut self, recipe_id: u64) -> Result<(), PantryError> {
        let before = self.ratings.len();
        self.ratings.retain(|r| r.recipe_id != recipe_id);
        if self.ratings.len() == before {
            return Err(PantryError::not_found("Rating", recipe_id));
        }
        Ok(())
    }

    pub fn ratings_summary(&self, recipe_id: u64) -> RatingsSummary {
        let scores: Vec<f64> = self
            .ratings
            .iter()
            .filter(|r| r.recipe_id == recipe_id)
            .map(|r| f64::from(r.score))
            .collect();

        let average = if scores.is_empty() {
            None
        } else {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            Some((mean * 10.0).round() / 10.0)
        };

        RatingsSummary {
            average,
            count: scores.len(),
        }
    }

    /// All ratings of a recipe, newest first, with their summary.
    pub fn recipe_ratings(&self, recipe_id: u64) -> Result<RecipeRatings, PantryError> {
        self.require_recipe(recipe_id)?;

        let mut ratings: Vec<Rating> = self
            .ratings
            .iter()
            .filter(|r| r.recipe_id == recipe_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let summary = self.ratings_summary(recipe_id);
        Ok(RecipeRatings {
            recipe_id,
            ratings,
            average: summary.average,
            count: summary.count,
        })
    }
}

use crate::models::MealType;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PlanningError {
    #[error("Invalid date: {0}. Use ISO format.")]
    InvalidDate(String),

    #[error("No full week fits after {0}")]
    OutOfRange(NaiveDate),

    #[error("A {} is already planned for {date}", .meal_type.as_str())]
    SlotTaken { date: NaiveDate, meal_type: MealType },
}

#[derive(Error, Debug, PartialEq)]
pub enum PantryError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Planning(#[from] PlanningError),
}

impl PantryError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        PantryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

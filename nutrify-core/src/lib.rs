pub mod amount;
pub mod collections;
pub mod error;
pub mod fridge;
pub mod models;
pub mod pantry;
pub mod planning;
pub mod ratings;
pub mod recipe;
pub mod shopping;
pub mod units;

pub use error::{PantryError, PlanningError};
pub use pantry::{IngredientRef, Pantry, UpsertAction};
pub use units::{
    convert_unit, convertible_units, format_quantity_with_conversions, primary_unit, unit_group,
    Alternative, FormattedQuantity, Unit, UnitGroup,
};

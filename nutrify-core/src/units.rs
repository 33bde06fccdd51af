//! Ingredient quantity unit conversion.
//!
//! Units fall into three groups: volume, weight and count. A quantity converts
//! between two units of the same group by going through the group's
//! intermediate unit (tablespoons for volume, grams for weight). Count units
//! never convert. Every converted value is rounded to two decimal places, so
//! the results are meant for display rather than further arithmetic.
//!
//! Labels are matched exactly (`"cup"`, not `"Cups"`). Anything outside the
//! recognized vocabulary is treated as ungrouped rather than as an error.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Volume conversion factors to tablespoons.
const TBSP_PER_CUP: f64 = 16.0;
const TBSP_PER_TBSP: f64 = 1.0;
const TBSP_PER_TSP: f64 = 1.0 / 3.0;

/// Weight conversion factors to grams.
const GRAMS_PER_LB: f64 = 453.592;
const GRAMS_PER_OZ: f64 = 28.3495;
const GRAMS_PER_GRAM: f64 = 1.0;

/// Group members in alphabetical order, which is the order alternatives are listed in.
const VOLUME_UNITS: [Unit; 3] = [Unit::Cup, Unit::Tablespoon, Unit::Teaspoon];
const WEIGHT_UNITS: [Unit; 3] = [Unit::Gram, Unit::Ounce, Unit::Pound];
const COUNT_UNITS: [Unit; 1] = [Unit::Piece];

/// Dimensional category a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitGroup {
    Volume,
    Weight,
    Count,
}

impl UnitGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitGroup::Volume => "volume",
            UnitGroup::Weight => "weight",
            UnitGroup::Count => "count",
        }
    }

    /// Canonical display unit for the group.
    pub fn primary(&self) -> Unit {
        match self {
            UnitGroup::Volume => Unit::Cup,
            UnitGroup::Weight => Unit::Gram,
            UnitGroup::Count => Unit::Piece,
        }
    }

    pub fn members(&self) -> &'static [Unit] {
        match self {
            UnitGroup::Volume => &VOLUME_UNITS,
            UnitGroup::Weight => &WEIGHT_UNITS,
            UnitGroup::Count => &COUNT_UNITS,
        }
    }
}

impl fmt::Display for UnitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recognized unit label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Cup,
    Tablespoon,
    Teaspoon,
    Gram,
    Ounce,
    Pound,
    Piece,
}

impl Unit {
    pub const ALL: [Unit; 7] = [
        Unit::Cup,
        Unit::Tablespoon,
        Unit::Teaspoon,
        Unit::Gram,
        Unit::Ounce,
        Unit::Pound,
        Unit::Piece,
    ];

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "cup" => Some(Unit::Cup),
            "tablespoon" => Some(Unit::Tablespoon),
            "teaspoon" => Some(Unit::Teaspoon),
            "gram" => Some(Unit::Gram),
            "ounce" => Some(Unit::Ounce),
            "pound" => Some(Unit::Pound),
            "piece" => Some(Unit::Piece),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Unit::Cup => "cup",
            Unit::Tablespoon => "tablespoon",
            Unit::Teaspoon => "teaspoon",
            Unit::Gram => "gram",
            Unit::Ounce => "ounce",
            Unit::Pound => "pound",
            Unit::Piece => "piece",
        }
    }

    pub fn group(&self) -> UnitGroup {
        match self {
            Unit::Cup | Unit::Tablespoon | Unit::Teaspoon => UnitGroup::Volume,
            Unit::Gram | Unit::Ounce | Unit::Pound => UnitGroup::Weight,
            Unit::Piece => UnitGroup::Count,
        }
    }

    /// How many intermediate units (tablespoons or grams) one of this unit is.
    /// Count units have no intermediate.
    fn intermediate_factor(&self) -> Option<f64> {
        match self {
            Unit::Cup => Some(TBSP_PER_CUP),
            Unit::Tablespoon => Some(TBSP_PER_TBSP),
            Unit::Teaspoon => Some(TBSP_PER_TSP),
            Unit::Pound => Some(GRAMS_PER_LB),
            Unit::Ounce => Some(GRAMS_PER_OZ),
            Unit::Gram => Some(GRAMS_PER_GRAM),
            Unit::Piece => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An equivalent rendering of a quantity in a sibling unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    pub quantity: f64,
    pub unit: String,
}

/// A display-ready quantity: the (possibly normalized) amount and unit plus
/// its equivalents in the other units of the same group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedQuantity {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub alternatives: Vec<Alternative>,
}

/// Empty labels count as absent.
fn present(unit: Option<&str>) -> Option<&str> {
    unit.filter(|u| !u.is_empty())
}

/// Zero, NaN and infinite quantities count as absent.
fn usable(quantity: Option<f64>) -> Option<f64> {
    quantity.filter(|q| q.is_finite() && *q != 0.0)
}

fn round_to_hundredths(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Classify a unit label. Absent or unrecognized labels have no group.
pub fn unit_group(unit: Option<&str>) -> Option<UnitGroup> {
    present(unit)
        .and_then(Unit::from_label)
        .map(|u| u.group())
}

/// All units a quantity in `unit` can be rendered in, including `unit` itself.
///
/// Count units have no peers, so they get an empty list just like absent and
/// unrecognized labels.
pub fn convertible_units(unit: Option<&str>) -> Vec<&'static str> {
    match unit_group(unit) {
        Some(UnitGroup::Count) | None => Vec::new(),
        Some(group) => group.members().iter().map(|u| u.label()).collect(),
    }
}

/// Convert `quantity` from one unit to another within the same group.
///
/// Returns `None` for a missing or zero quantity, a missing unit, units that
/// do not share a group, or a result too large to represent. Converting a unit to itself returns the quantity
/// untouched without checking that the unit is recognized.
pub fn convert_unit(
    quantity: Option<f64>,
    from_unit: Option<&str>,
    to_unit: Option<&str>,
) -> Option<f64> {
    let quantity = usable(quantity)?;
    let from_label = present(from_unit)?;
    let to_label = present(to_unit)?;

    if from_label == to_label {
        return Some(quantity);
    }

    let from = Unit::from_label(from_label)?;
    let to = Unit::from_label(to_label)?;
    if from.group() != to.group() {
        return None;
    }

    let from_factor = from.intermediate_factor()?;
    let to_factor = to.intermediate_factor()?;

    let converted = quantity * from_factor / to_factor;
    converted
        .is_finite()
        .then(|| round_to_hundredths(converted))
}

/// The canonical display unit for `unit`'s group, or `unit` itself when it is
/// not recognized.
pub fn primary_unit(unit: &str) -> &str {
    match Unit::from_label(unit) {
        Some(u) => u.group().primary().label(),
        None => unit,
    }
}

/// Build the display bundle for a quantity.
///
/// With `include_conversions`, the quantity is first normalized to its
/// group's primary unit and then rendered in every other unit of the group.
/// Pieces are never expanded, and a missing quantity or unit passes through
/// as-is with no alternatives.
pub fn format_quantity_with_conversions(
    quantity: Option<f64>,
    unit: Option<&str>,
    include_conversions: bool,
) -> FormattedQuantity {
    let mut result = FormattedQuantity {
        quantity,
        unit: unit.map(str::to_string),
        alternatives: Vec::new(),
    };

    let (Some(amount), Some(label)) = (usable(quantity), present(unit)) else {
        return result;
    };

    if label == Unit::Piece.label() {
        return result;
    }

    let convertible = convertible_units(Some(label));
    if !include_conversions || convertible.is_empty() {
        return result;
    }

    let mut base_quantity = amount;
    let mut base_unit = label;

    let primary = primary_unit(label);
    if label != primary {
        let normalized = convert_unit(Some(amount), Some(label), Some(primary))
            .filter(|q| q.is_finite() && *q != 0.0);
        match normalized {
            Some(normalized) => {
                base_quantity = normalized;
                base_unit = primary;
            }
            None => {
                tracing::debug!(
                    quantity = amount,
                    unit = label,
                    primary = primary,
                    "quantity too small to normalize, keeping original unit"
                );
            }
        }
    }

    result.alternatives = convertible
        .into_iter()
        .filter(|alt| *alt != base_unit)
        .filter_map(|alt| {
            let alt_quantity = convert_unit(Some(base_quantity), Some(base_unit), Some(alt))
                .filter(|q| q.is_finite() && *q != 0.0)?;
            Some(Alternative {
                quantity: alt_quantity,
                unit: alt.to_string(),
            })
        })
        .collect();
    result.quantity = Some(base_quantity);
    result.unit = Some(base_unit.to_string());

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternative(formatted: &FormattedQuantity, unit: &str) -> Option<f64> {
        formatted
            .alternatives
            .iter()
            .find(|a| a.unit == unit)
            .map(|a| a.quantity)
    }

    #[test]
    fn test_unit_group() {
        assert_eq!(unit_group(Some("cup")), Some(UnitGroup::Volume));
        assert_eq!(unit_group(Some("teaspoon")), Some(UnitGroup::Volume));
        assert_eq!(unit_group(Some("ounce")), Some(UnitGroup::Weight));
        assert_eq!(unit_group(Some("gram")), Some(UnitGroup::Weight));
        assert_eq!(unit_group(Some("piece")), Some(UnitGroup::Count));
        assert_eq!(unit_group(Some("pinch")), None);
        assert_eq!(unit_group(Some("Cup")), None);
        assert_eq!(unit_group(Some("")), None);
        assert_eq!(unit_group(None), None);
    }

    #[test]
    fn test_groups_are_disjoint() {
        for unit in Unit::ALL {
            let owners: Vec<UnitGroup> = [UnitGroup::Volume, UnitGroup::Weight, UnitGroup::Count]
                .into_iter()
                .filter(|g| g.members().contains(&unit))
                .collect();
            assert_eq!(owners, vec![unit.group()], "{} must be in exactly one group", unit);
        }
    }

    #[test]
    fn test_labels_round_trip() {
        for unit in Unit::ALL {
            assert_eq!(Unit::from_label(unit.label()), Some(unit));
        }
    }

    #[test]
    fn test_convertible_units() {
        assert_eq!(
            convertible_units(Some("tablespoon")),
            vec!["cup", "tablespoon", "teaspoon"]
        );
        assert_eq!(convertible_units(Some("pound")), vec!["gram", "ounce", "pound"]);
        assert!(convertible_units(Some("piece")).is_empty());
        assert!(convertible_units(Some("handful")).is_empty());
        assert!(convertible_units(None).is_empty());
    }

    #[test]
    fn test_recognized_unit_is_its_own_candidate() {
        for unit in Unit::ALL {
            let convertible = convertible_units(Some(unit.label()));
            if unit.group() == UnitGroup::Count {
                assert!(convertible.is_empty());
            } else {
                assert!(convertible.contains(&unit.label()));
            }
        }
    }

    #[test]
    fn test_convert_cup_to_tablespoon() {
        assert_eq!(convert_unit(Some(1.0), Some("cup"), Some("tablespoon")), Some(16.0));
    }

    #[test]
    fn test_convert_teaspoons_to_cup() {
        assert_eq!(convert_unit(Some(48.0), Some("teaspoon"), Some("cup")), Some(1.0));
    }

    #[test]
    fn test_convert_pound_to_gram() {
        assert_eq!(convert_unit(Some(1.0), Some("pound"), Some("gram")), Some(453.59));
    }

    #[test]
    fn test_convert_rounds_to_two_decimals() {
        // 1 tsp = 1/48 cup = 0.0208...
        assert_eq!(convert_unit(Some(1.0), Some("teaspoon"), Some("cup")), Some(0.02));
        // 100 g / 28.3495 = 3.527...
        assert_eq!(convert_unit(Some(100.0), Some("gram"), Some("ounce")), Some(3.53));
    }

    #[test]
    fn test_identity_skips_group_check() {
        assert_eq!(convert_unit(Some(3.7), Some("cup"), Some("cup")), Some(3.7));
        assert_eq!(convert_unit(Some(2.0), Some("pinch"), Some("pinch")), Some(2.0));
        assert_eq!(convert_unit(Some(1.234), Some("gram"), Some("gram")), Some(1.234));
    }

    #[test]
    fn test_convert_refuses_cross_group() {
        assert_eq!(convert_unit(Some(1.0), Some("cup"), Some("gram")), None);
        assert_eq!(convert_unit(Some(1.0), Some("piece"), Some("ounce")), None);
        assert_eq!(convert_unit(Some(1.0), Some("pinch"), Some("cup")), None);
        assert_eq!(convert_unit(Some(1.0), Some("cup"), Some("dash")), None);
    }

    #[test]
    fn test_convert_missing_inputs() {
        assert_eq!(convert_unit(None, Some("cup"), Some("tablespoon")), None);
        assert_eq!(convert_unit(Some(0.0), Some("cup"), Some("tablespoon")), None);
        assert_eq!(convert_unit(Some(f64::NAN), Some("cup"), Some("tablespoon")), None);
        assert_eq!(convert_unit(Some(1.0), None, Some("tablespoon")), None);
        assert_eq!(convert_unit(Some(1.0), Some("cup"), None), None);
        assert_eq!(convert_unit(Some(1.0), Some(""), Some("")), None);
    }

    #[test]
    fn test_convert_is_absent_when_groups_differ() {
        let labels: Vec<Option<&str>> = Unit::ALL
            .iter()
            .map(|u| Some(u.label()))
            .chain([Some("pinch"), None])
            .collect();
        for from in &labels {
            for to in &labels {
                if from != to && unit_group(*from) != unit_group(*to) {
                    assert_eq!(convert_unit(Some(5.0), *from, *to), None, "{from:?} -> {to:?}");
                }
            }
        }
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        for group in [UnitGroup::Volume, UnitGroup::Weight] {
            for a in group.members() {
                for b in group.members() {
                    // Going to a larger unit first loses precision below 0.01
                    // of the larger unit, so only check toward smaller units.
                    if a.intermediate_factor() < b.intermediate_factor() {
                        continue;
                    }
                    for q in [1.0, 2.5, 7.0, 12.25] {
                        let there = convert_unit(Some(q), Some(a.label()), Some(b.label()));
                        let back = convert_unit(there, Some(b.label()), Some(a.label()))
                            .expect("round trip should produce a value");
                        assert!((back - q).abs() <= 0.0101, "{q} {a} -> {b} -> {back}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_primary_unit() {
        assert_eq!(primary_unit("teaspoon"), "cup");
        assert_eq!(primary_unit("cup"), "cup");
        assert_eq!(primary_unit("pound"), "gram");
        assert_eq!(primary_unit("piece"), "piece");
        assert_eq!(primary_unit("clove"), "clove");
    }

    #[test]
    fn test_format_piece_never_expands() {
        let formatted = format_quantity_with_conversions(Some(2.0), Some("piece"), true);
        assert_eq!(
            formatted,
            FormattedQuantity {
                quantity: Some(2.0),
                unit: Some("piece".to_string()),
                alternatives: vec![],
            }
        );
    }

    #[test]
    fn test_format_cup_lists_alternatives() {
        let formatted = format_quantity_with_conversions(Some(1.0), Some("cup"), true);
        assert_eq!(formatted.quantity, Some(1.0));
        assert_eq!(formatted.unit.as_deref(), Some("cup"));
        assert_eq!(formatted.alternatives.len(), 2);
        assert_eq!(alternative(&formatted, "tablespoon"), Some(16.0));
        assert_eq!(alternative(&formatted, "teaspoon"), Some(48.0));
        assert_eq!(alternative(&formatted, "cup"), None);
    }

    #[test]
    fn test_format_missing_quantity_passes_through() {
        let formatted = format_quantity_with_conversions(None, Some("gram"), true);
        assert_eq!(
            formatted,
            FormattedQuantity {
                quantity: None,
                unit: Some("gram".to_string()),
                alternatives: vec![],
            }
        );
    }

    #[test]
    fn test_format_missing_unit_passes_through() {
        let formatted = format_quantity_with_conversions(Some(3.0), None, true);
        assert_eq!(formatted.quantity, Some(3.0));
        assert_eq!(formatted.unit, None);
        assert!(formatted.alternatives.is_empty());
    }

    #[test]
    fn test_format_normalizes_to_primary() {
        let formatted = format_quantity_with_conversions(Some(8.0), Some("ounce"), true);
        // 8 oz = 226.796 g
        assert_eq!(formatted.quantity, Some(226.8));
        assert_eq!(formatted.unit.as_deref(), Some("gram"));
        assert_eq!(alternative(&formatted, "ounce"), Some(8.0));
        assert_eq!(alternative(&formatted, "pound"), Some(0.5));
        assert_eq!(alternative(&formatted, "gram"), None);
    }

    #[test]
    fn test_format_without_conversions_keeps_original() {
        let formatted = format_quantity_with_conversions(Some(8.0), Some("ounce"), false);
        assert_eq!(formatted.quantity, Some(8.0));
        assert_eq!(formatted.unit.as_deref(), Some("ounce"));
        assert!(formatted.alternatives.is_empty());
    }

    #[test]
    fn test_format_unrecognized_unit() {
        let formatted = format_quantity_with_conversions(Some(2.0), Some("clove"), true);
        assert_eq!(formatted.quantity, Some(2.0));
        assert_eq!(formatted.unit.as_deref(), Some("clove"));
        assert!(formatted.alternatives.is_empty());
    }

    #[test]
    fn test_format_tiny_quantity_keeps_original_unit() {
        // 0.1 tsp is 0.002 cup, which rounds to zero and is not used.
        let formatted = format_quantity_with_conversions(Some(0.1), Some("teaspoon"), true);
        assert_eq!(formatted.quantity, Some(0.1));
        assert_eq!(formatted.unit.as_deref(), Some("teaspoon"));
        assert_eq!(alternative(&formatted, "tablespoon"), Some(0.03));
        assert_eq!(alternative(&formatted, "cup"), None);
    }

    #[test]
    fn test_format_alternatives_stay_in_group() {
        for unit in Unit::ALL {
            let formatted = format_quantity_with_conversions(Some(3.0), Some(unit.label()), true);
            let normalized = formatted.unit.clone().expect("unit should be present");
            for alt in &formatted.alternatives {
                assert_ne!(alt.unit, normalized);
                assert_eq!(
                    unit_group(Some(alt.unit.as_str())),
                    unit_group(Some(normalized.as_str()))
                );
            }
        }
    }

    #[test]
    fn test_huge_quantities_never_produce_infinite_alternatives() {
        assert_eq!(convert_unit(Some(1e308), Some("cup"), Some("teaspoon")), None);
        assert_eq!(convert_unit(Some(1e308), Some("cup"), Some("cup")), Some(1e308));

        let formatted = format_quantity_with_conversions(Some(1e308), Some("cup"), true);
        assert_eq!(formatted.quantity, Some(1e308));
        assert_eq!(formatted.unit.as_deref(), Some("cup"));
        assert!(formatted.alternatives.iter().all(|a| a.quantity.is_finite()));
        assert_eq!(alternative(&formatted, "tablespoon"), None);

        let formatted = format_quantity_with_conversions(Some(f64::MAX), Some("pound"), true);
        assert!(formatted.quantity.is_some_and(f64::is_finite));
        assert!(formatted.alternatives.iter().all(|a| a.quantity.is_finite()));
    }

    #[test]
    fn test_formatted_quantity_json_shape() {
        let formatted = format_quantity_with_conversions(None, Some("gram"), true);
        let json = serde_json::to_value(&formatted).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"quantity": null, "unit": "gram", "alternatives": []})
        );
    }
}

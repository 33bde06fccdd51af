//! Numeric coercion for free-text amounts.
//!
//! Shopping list entries store their amount as text ("2", "1/2", "1 1/2"),
//! so anything that feeds the unit converter goes through [`parse_amount`]
//! first. Text that is not a number yields `None` instead of an error.

/// Parse an amount string into a decimal value.
///
/// Handles:
/// - Integers: "8" → 8.0
/// - Decimals: "2.5" → 2.5
/// - Fractions: "1/2" → 0.5
/// - Mixed numbers: "1 1/2" → 1.5
pub fn parse_amount(amount: &str) -> Option<f64> {
    let amount = amount.trim();

    if amount.is_empty() {
        return None;
    }

    // Try mixed number: "1 1/2" or "2 3/4"
    let parts: Vec<&str> = amount.split_whitespace().collect();
    if parts.len() == 2 {
        let whole = parse_decimal(parts[0])?;
        let frac = parse_fraction(parts[1])?;
        return Some(whole + frac);
    }

    if amount.contains('/') {
        return parse_fraction(amount);
    }

    parse_decimal(amount)
}

/// Parse an optional amount, treating absent text like unparseable text.
pub fn parse_optional_amount(amount: Option<&str>) -> Option<f64> {
    amount.and_then(parse_amount)
}

/// Rejects "inf" and "NaN", which `f64::from_str` would otherwise accept.
fn parse_decimal(s: &str) -> Option<f64> {
    let value: f64 = s.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

fn parse_fraction(s: &str) -> Option<f64> {
    let (num, denom) = s.split_once('/')?;
    let num = parse_decimal(num)?;
    let denom = parse_decimal(denom)?;
    if denom == 0.0 {
        return None;
    }
    Some(num / denom)
}

/// Render an amount without trailing zeros: 16.0 → "16", 0.50 → "0.5".
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}", rounded)
    } else {
        let text = format!("{:.2}", rounded);
        text.trim_end_matches('0').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_integer() {
        assert_eq!(parse_amount("8"), Some(8.0));
        assert_eq!(parse_amount(" 12 "), Some(12.0));
    }

    #[test]
    fn test_parse_amount_decimal() {
        assert_eq!(parse_amount("2.5"), Some(2.5));
        assert_eq!(parse_amount("0.25"), Some(0.25));
    }

    #[test]
    fn test_parse_amount_fraction() {
        assert_eq!(parse_amount("1/2"), Some(0.5));
        assert_eq!(parse_amount("3/4"), Some(0.75));
    }

    #[test]
    fn test_parse_amount_mixed_number() {
        assert_eq!(parse_amount("1 1/2"), Some(1.5));
        assert_eq!(parse_amount("2 3/4"), Some(2.75));
    }

    #[test]
    fn test_parse_amount_rejects_text() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("a handful"), None);
        assert_eq!(parse_amount("some"), None);
        assert_eq!(parse_amount("1/0"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("1 2 3"), None);
    }

    #[test]
    fn test_parse_optional_amount() {
        assert_eq!(parse_optional_amount(Some("3")), Some(3.0));
        assert_eq!(parse_optional_amount(None), None);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(16.0), "16");
        assert_eq!(format_amount(0.5), "0.5");
        assert_eq!(format_amount(453.59), "453.59");
        assert_eq!(format_amount(0.333333), "0.33");
        assert_eq!(format_amount(2.999), "3");
    }
}

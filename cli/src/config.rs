//! CLI configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Fallback pantry location when there is no home directory.
pub const FALLBACK_PANTRY_FILE: &str = "data/pantry.json";

/// Whether views render unit alternatives unless told otherwise.
pub const DEFAULT_INCLUDE_CONVERSIONS: bool = true;

#[derive(Debug, Clone, PartialEq)]
pub struct CliConfig {
    /// JSON file holding the pantry.
    pub pantry_file: PathBuf,
    /// Default for views that can show alternatives.
    pub include_conversions: bool,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `NUTRIFY_PANTRY_FILE`: Pantry file (default: "~/.nutrify/pantry.json")
    /// - `NUTRIFY_INCLUDE_CONVERSIONS`: Show unit alternatives (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pantry_file = lookup("NUTRIFY_PANTRY_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(Self::default_pantry_file);

        let include_conversions = lookup("NUTRIFY_INCLUDE_CONVERSIONS")
            .and_then(|v| parse_flag(&v))
            .unwrap_or(DEFAULT_INCLUDE_CONVERSIONS);

        Self {
            pantry_file,
            include_conversions,
        }
    }

    /// Get the default pantry file: ~/.nutrify/pantry.json
    pub fn default_pantry_file() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".nutrify").join("pantry.json"))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_PANTRY_FILE))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.pantry_file, CliConfig::default_pantry_file());
        assert!(config.include_conversions);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("NUTRIFY_PANTRY_FILE", "/tmp/kitchen.json"),
            ("NUTRIFY_INCLUDE_CONVERSIONS", "0"),
        ]);
        assert_eq!(config.pantry_file, PathBuf::from("/tmp/kitchen.json"));
        assert!(!config.include_conversions);
    }

    #[test]
    fn test_unrecognized_flag_keeps_default() {
        let config = config_from(&[("NUTRIFY_INCLUDE_CONVERSIONS", "sometimes")]);
        assert!(config.include_conversions);
    }
}

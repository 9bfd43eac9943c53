//! Declarative row predicates over lookup table columns.

use serde::{Deserialize, Serialize};

/// One condition a lookup table row must satisfy.
///
/// Deserializes from tagged maps, e.g.
///
/// ```yaml
/// - predicate: one_of
///   column: Aerosol Quantity
///   values: [Low, Average]
/// - predicate: is_true
///   column: Valid data
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "predicate", rename_all = "snake_case")]
pub enum QualityRule {
    Equals { column: String, value: String },
    OneOf { column: String, values: Vec<String> },
    NoneOf { column: String, values: Vec<String> },
    IsTrue { column: String },
    IsFalse { column: String },
}

impl QualityRule {
    pub fn equals(column: &str, value: &str) -> Self {
        Self::Equals {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn one_of(column: &str, values: &[&str]) -> Self {
        Self::OneOf {
            column: column.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn none_of(column: &str, values: &[&str]) -> Self {
        Self::NoneOf {
            column: column.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn is_true(column: &str) -> Self {
        Self::IsTrue {
            column: column.to_string(),
        }
    }

    pub fn is_false(column: &str) -> Self {
        Self::IsFalse {
            column: column.to_string(),
        }
    }

    /// Column the rule reads.
    pub fn column(&self) -> &str {
        match self {
            Self::Equals { column, .. }
            | Self::OneOf { column, .. }
            | Self::NoneOf { column, .. }
            | Self::IsTrue { column }
            | Self::IsFalse { column } => column,
        }
    }

    /// Test one cell. Text comparisons are exact after trimming.
    pub fn matches(&self, cell: &str) -> bool {
        let cell = cell.trim();
        match self {
            Self::Equals { value, .. } => cell == value,
            Self::OneOf { values, .. } => values.iter().any(|v| v == cell),
            Self::NoneOf { values, .. } => !values.iter().any(|v| v == cell),
            Self::IsTrue { .. } => parse_bool(cell) == Some(true),
            Self::IsFalse { .. } => parse_bool(cell) == Some(false),
        }
    }
}

/// Parse a boolean table cell: true/false, yes/no or 1/0, any case.
pub fn parse_bool(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("True"), Some(true));
        assert_eq!(parse_bool(" no "), Some(false));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("None"), None);
    }

    #[test]
    fn test_non_boolean_fails_both_boolean_rules() {
        assert!(!QualityRule::is_true("Valid data").matches("maybe"));
        assert!(!QualityRule::is_false("Valid data").matches("maybe"));
    }

    #[test]
    fn test_set_predicates() {
        let rule = QualityRule::one_of("Aerosol Quantity", &["Low", "Average"]);
        assert!(rule.matches("Average"));
        assert!(!rule.matches("High"));

        let rule = QualityRule::none_of("VI Usefulness", &["Lowest quality"]);
        assert!(rule.matches("Highest quality"));
        assert!(!rule.matches("Lowest quality"));
    }

    #[test]
    fn test_equals_is_case_sensitive() {
        let rule = QualityRule::equals("Mixed Clouds", "No");
        assert!(rule.matches("No"));
        assert!(!rule.matches("no"));
    }
}

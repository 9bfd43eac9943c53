//! Lookup table evaluation.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use raster_common::QualityTableError;

use crate::rules::QualityRule;

/// Default name of the column holding the quality code.
pub const DEFAULT_CODE_COLUMN: &str = "Value";

/// Acceptable quality codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualityCodeSet(BTreeSet<i64>);

impl QualityCodeSet {
    pub fn contains(&self, code: i64) -> bool {
        self.0.contains(&code)
    }

    /// Membership test for a raster cell. NaN and fractional values are
    /// never members.
    pub fn contains_value(&self, value: f64) -> bool {
        if !value.is_finite() || value.fract() != 0.0 {
            return false;
        }
        self.0.contains(&(value as i64))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<i64> for QualityCodeSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Applies a rule set to a quality lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityFilterEngine {
    rules: Vec<QualityRule>,
    code_column: String,
}

impl QualityFilterEngine {
    pub fn new(rules: Vec<QualityRule>) -> Self {
        Self {
            rules,
            code_column: DEFAULT_CODE_COLUMN.to_string(),
        }
    }

    pub fn with_code_column(mut self, column: impl Into<String>) -> Self {
        self.code_column = column.into();
        self
    }

    pub fn rules(&self) -> &[QualityRule] {
        &self.rules
    }

    pub fn code_column(&self) -> &str {
        &self.code_column
    }

    /// Evaluate a lookup table CSV on disk.
    pub fn evaluate_path(&self, path: impl AsRef<Path>) -> Result<QualityCodeSet, QualityTableError> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let file = File::open(path).map_err(|e| QualityTableError::Read {
            path: source.clone(),
            message: e.to_string(),
        })?;

        let codes = self.evaluate_reader(file, &source)?;
        info!(
            path = %source,
            rules = self.rules.len(),
            accepted = codes.len(),
            "Derived acceptable quality codes"
        );
        Ok(codes)
    }

    /// Evaluate a lookup table from any reader. `source` names it in errors.
    pub fn evaluate_reader<R: Read>(
        &self,
        reader: R,
        source: &str,
    ) -> Result<QualityCodeSet, QualityTableError> {
        let read_error = |e: csv::Error| QualityTableError::Read {
            path: source.to_string(),
            message: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers().map_err(read_error)?.clone();
        let header_map: HashMap<&str, usize> =
            headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

        let column_index = |name: &str| {
            header_map
                .get(name)
                .copied()
                .ok_or_else(|| QualityTableError::MissingColumn(name.to_string()))
        };

        // Resolve every column up front so a bad rule fails even on an empty table
        let code_idx = column_index(&self.code_column)?;
        let rule_columns = self
            .rules
            .iter()
            .map(|rule| column_index(rule.column()).map(|idx| (rule, idx)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut codes = BTreeSet::new();
        for (idx, result) in reader.records().enumerate() {
            // 1-based line number, header is line 1
            let line = idx + 2;
            let record = result.map_err(read_error)?;

            let raw = record.get(code_idx).unwrap_or("");
            let code = parse_code(raw).ok_or_else(|| QualityTableError::InvalidCode {
                row: line,
                value: raw.to_string(),
            })?;

            let passes = rule_columns
                .iter()
                .all(|(rule, col)| rule.matches(record.get(*col).unwrap_or("")));
            if passes {
                debug!(line, code, "Quality code accepted");
                codes.insert(code);
            }
        }

        Ok(QualityCodeSet(codes))
    }
}

/// Integer code cell. Accepts `2112` and `2112.0`.
fn parse_code(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if let Ok(code) = cell.parse::<i64>() {
        return Some(code);
    }
    cell.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .map(|v| v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_value() {
        let set: QualityCodeSet = [1, 2112].into_iter().collect();
        assert!(set.contains_value(2112.0));
        assert!(!set.contains_value(2112.5));
        assert!(!set.contains_value(f64::NAN));
        assert!(!set.contains_value(3.0));
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("2112"), Some(2112));
        assert_eq!(parse_code(" 7.0 "), Some(7));
        assert_eq!(parse_code("7.5"), None);
        assert_eq!(parse_code("abc"), None);
    }

    #[test]
    fn test_no_rules_accepts_every_row() {
        let table = "Value,Flag\n1,a\n2,b\n";
        let codes = QualityFilterEngine::new(vec![])
            .evaluate_reader(table.as_bytes(), "inline")
            .unwrap();
        assert_eq!(codes.iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_invalid_code_fails_table() {
        let table = "Value,Flag\nx,no\n4,yes\n";
        let engine = QualityFilterEngine::new(vec![QualityRule::is_true("Flag")]);
        let err = engine.evaluate_reader(table.as_bytes(), "inline").unwrap_err();
        assert!(matches!(err, QualityTableError::InvalidCode { row: 2, .. }));
    }
}

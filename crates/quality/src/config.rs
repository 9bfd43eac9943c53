//! Serde configuration shared by every consumer of quality layers.

use serde::{Deserialize, Serialize};

use crate::engine::{QualityFilterEngine, DEFAULT_CODE_COLUMN};
use crate::presets;
use crate::rules::QualityRule;

/// Derives a quality file name from a value file name by substring
/// replacement, e.g. `NDVI` -> `VI_Quality`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityPairing {
    pub from: String,
    pub to: String,
}

impl QualityPairing {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Quality file name for a value file name; `None` if the name does
    /// not contain the pattern.
    pub fn quality_name(&self, value_name: &str) -> Option<String> {
        value_name
            .contains(&self.from)
            .then(|| value_name.replacen(&self.from, &self.to, 1))
    }

    /// Whether the pairing maps a name to a different name.
    pub fn is_valid(&self) -> bool {
        !self.from.is_empty() && self.from != self.to
    }
}

/// Built-in quality rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    VegetationIndex,
    BurnArea,
}

impl QualityPreset {
    pub fn rules(&self) -> Vec<QualityRule> {
        match self {
            Self::VegetationIndex => presets::vegetation_index_rules(),
            Self::BurnArea => presets::burn_area_rules(),
        }
    }
}

/// A preset and/or explicit rules, plus the code column name.
///
/// ```yaml
/// quality:
///   preset: vegetation_index
///   rules:
///     - { predicate: equals, column: Possible snow/ice, value: "No" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default)]
    pub preset: Option<QualityPreset>,
    /// Extra rules, applied after the preset's
    #[serde(default)]
    pub rules: Vec<QualityRule>,
    #[serde(default = "default_code_column")]
    pub code_column: String,
}

fn default_code_column() -> String {
    DEFAULT_CODE_COLUMN.to_string()
}

impl QualityConfig {
    /// True when the config names at least one rule.
    pub fn has_rules(&self) -> bool {
        self.preset.is_some() || !self.rules.is_empty()
    }

    pub fn engine(&self) -> QualityFilterEngine {
        let mut rules = self.preset.map(|p| p.rules()).unwrap_or_default();
        rules.extend(self.rules.iter().cloned());
        QualityFilterEngine::new(rules).with_code_column(self.code_column.clone())
    }
}

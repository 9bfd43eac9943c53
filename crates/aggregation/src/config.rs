//! Product definitions (`config/products/*.yaml`).
//!
//! One YAML file describes one product: where its layers live, how value
//! files pair with quality files, which quality codes are acceptable, how
//! raw values are scaled and how aggregates are reduced and imputed.
//!
//! Supports environment variable substitution using `${VAR}` and
//! `${VAR:-default}` syntax (see [`raster_common::env`]).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use boundary::BoundaryFields;
use quality::{QualityConfig, QualityPairing};
use raster_common::expand_env_vars;
use raster_io::{NodataSource, ScaleSource};

use crate::aggregate::Statistic;
use crate::impute::ImputePolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConfig {
    pub product: ProductMetadata,
    pub inputs: InputConfig,
    #[serde(default)]
    pub boundary_fields: BoundaryFields,
    pub quality: QualityConfig,
    #[serde(default)]
    pub scale: ScaleSource,
    #[serde(default)]
    pub nodata: NodataSource,
    #[serde(default)]
    pub statistic: Statistic,
    #[serde(default)]
    pub impute: ImputePolicy,
    /// Output CSV path
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory holding value and quality layers
    pub dir: PathBuf,
    /// File name prefix selecting the value layers
    pub value_prefix: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    pub quality_pairing: QualityPairing,
    /// Quality lookup table CSV
    pub quality_table: PathBuf,
    /// Boundary GeoJSON
    pub boundary: PathBuf,
}

fn default_suffix() -> String {
    ".tif".to_string()
}

impl ProductConfig {
    /// Load and validate a product YAML file with environment substitution.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read product config from {:?}", path.as_ref()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Invalid product config {:?}", path.as_ref()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;

        let config: ProductConfig =
            serde_yaml::from_str(&expanded).context("Failed to parse product config YAML")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.product.id.is_empty(), "Product ID cannot be empty");
        anyhow::ensure!(
            !self.inputs.value_prefix.is_empty(),
            "inputs.value_prefix cannot be empty"
        );
        anyhow::ensure!(
            self.inputs.quality_pairing.is_valid(),
            "inputs.quality_pairing must change the file name, got {:?} -> {:?}",
            self.inputs.quality_pairing.from,
            self.inputs.quality_pairing.to
        );
        anyhow::ensure!(
            self.quality.has_rules(),
            "quality must name a preset or list at least one rule"
        );
        anyhow::ensure!(
            !self.quality.code_column.is_empty(),
            "quality.code_column cannot be empty"
        );

        let scale = match self.scale {
            ScaleSource::Metadata { default } => default,
            ScaleSource::Fixed { value } => value,
        };
        anyhow::ensure!(
            scale.is_finite() && scale > 0.0,
            "Scale factor must be finite and positive, got {}",
            scale
        );

        if let NodataSource::Fixed { value } = self.nodata {
            anyhow::ensure!(!value.is_nan(), "Fixed nodata cannot be NaN, use source: none");
        }

        Ok(())
    }
}

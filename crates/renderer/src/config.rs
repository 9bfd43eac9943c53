//! Render job definitions (`config/render/*.yaml`).
//!
//! ```yaml
//! render: { id: thermal_anomaly, name: MOD14A2 fire mask }
//! inputs: { dir: raw_data/TA, prefix: MOD14A2 }
//! boundary: raw_data/California_State_Boundary.geojson
//! style: { file: config/styles/classification.json, name: thermal_anomaly }
//! label: { font: fonts/DejaVuSans.ttf, font_size: 30, x: 600, y: 50 }
//! output_dir: output/ta_frames
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use boundary::{BoundaryCatalog, BoundaryFields};
use quality::{QualityConfig, QualityPairing};
use raster_common::expand_env_vars;
use raster_io::{NodataSource, ScaleSource};

use crate::label::{LabelPainter, LabelStyle};
use crate::render::{FrameRenderer, QualityMask};
use crate::style::StyleConfig;

/// Id and name given to the merged boundary region.
const MERGED_REGION_ID: &str = "boundary";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub render: RenderMetadata,
    pub inputs: RenderInputs,
    /// Boundary GeoJSON; all features are merged into one region
    pub boundary: PathBuf,
    #[serde(default)]
    pub boundary_fields: BoundaryFields,
    pub style: StyleRef,
    #[serde(default)]
    pub label: LabelStyle,
    #[serde(default)]
    pub quality: Option<RenderQuality>,
    #[serde(default)]
    pub scale: ScaleSource,
    #[serde(default)]
    pub nodata: NodataSource,
    pub output_dir: PathBuf,
    /// Worker threads; defaults to available parallelism
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderInputs {
    pub dir: PathBuf,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_suffix() -> String {
    ".tif".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleRef {
    pub file: PathBuf,
    pub name: String,
}

/// Quality gating for rendered frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderQuality {
    pub pairing: QualityPairing,
    /// Quality lookup table CSV
    pub table: PathBuf,
    #[serde(flatten)]
    pub filter: QualityConfig,
}

impl RenderConfig {
    /// Load and validate a render YAML file with environment substitution.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read render config from {:?}", path.as_ref()))?;

        Self::from_yaml(&content)
            .with_context(|| format!("Invalid render config {:?}", path.as_ref()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;

        let config: RenderConfig =
            serde_yaml::from_str(&expanded).context("Failed to parse render config YAML")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.render.id.is_empty(), "Render ID cannot be empty");
        anyhow::ensure!(!self.style.name.is_empty(), "style.name cannot be empty");
        anyhow::ensure!(
            self.label.font_size.is_finite() && self.label.font_size > 0.0,
            "label.font_size must be positive, got {}",
            self.label.font_size
        );
        anyhow::ensure!(self.workers != Some(0), "workers must be at least 1");

        if let Some(quality) = &self.quality {
            anyhow::ensure!(
                quality.pairing.is_valid(),
                "quality.pairing must change the file name, got {:?} -> {:?}",
                quality.pairing.from,
                quality.pairing.to
            );
            anyhow::ensure!(
                quality.filter.has_rules(),
                "quality must name a preset or list at least one rule"
            );
        }

        let scale = match self.scale {
            ScaleSource::Metadata { default } => default,
            ScaleSource::Fixed { value } => value,
        };
        anyhow::ensure!(
            scale.is_finite() && scale > 0.0,
            "Scale factor must be finite and positive, got {}",
            scale
        );

        Ok(())
    }

    /// Load the boundary, style, font and quality codes into a renderer.
    pub fn build_renderer(&self) -> Result<FrameRenderer> {
        let catalog = BoundaryCatalog::load(&self.boundary, &self.boundary_fields)
            .context("Failed to load render boundary")?;
        let region = catalog.merged(MERGED_REGION_ID, &self.render.name);

        let table = StyleConfig::from_file(&self.style.file)
            .and_then(|styles| styles.table(&self.style.name))
            .with_context(|| format!("Failed to load style {:?} from {:?}", self.style.name, self.style.file))?;

        let label = LabelPainter::load(&self.label);
        let label_overlay = label.has_font();

        let mut renderer =
            FrameRenderer::new(region, table, label).with_scaling(self.nodata, self.scale);

        if let Some(quality) = &self.quality {
            let codes = quality
                .filter
                .engine()
                .evaluate_path(&quality.table)
                .context("Failed to load quality table")?;
            info!(table = %quality.table.display(), codes = codes.len(), "Quality gating enabled");
            renderer = renderer.with_quality(QualityMask {
                pairing: quality.pairing.clone(),
                codes: Arc::new(codes),
            });
        }

        info!(
            render = %self.render.id,
            style = %self.style.name,
            regions = catalog.len(),
            label_overlay,
            "Renderer ready"
        );
        Ok(renderer)
    }
}

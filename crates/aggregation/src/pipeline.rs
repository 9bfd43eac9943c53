//! The temporal aggregation pipeline.
//!
//! `LoadReferences -> ForEachFile { ForEachRegion { Clip -> Scale ->
//! Aggregate } } -> Impute -> Sort`. Reference loading is fatal; every
//! per-file or per-region failure is logged, recorded as a skip and
//! produces no row.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use boundary::{BoundaryCatalog, BoundaryRegion};
use quality::QualityCodeSet;
use raster_common::{AcquisitionDate, PipelineError, RasterGrid, ReferenceLoadError};
use raster_io::{read_geotiff, RasterClipper, ValueScaler};

use crate::aggregate::MaskedAggregator;
use crate::config::ProductConfig;
use crate::impute::sort_by_region;
use crate::record::{AggregationRecord, RunSummary, SkippedItem, TimeSeriesResult};

/// Reference data loaded once per run and shared by every task.
#[derive(Debug, Clone)]
pub struct References {
    pub catalog: BoundaryCatalog,
    pub codes: Arc<QualityCodeSet>,
}

/// A value layer and the quality layer derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPair {
    pub value: PathBuf,
    /// `None` when the file name does not contain the pairing pattern
    pub quality: Option<PathBuf>,
}

impl InputPair {
    fn name(&self) -> String {
        file_name(&self.value)
    }
}

/// Rows and skips produced by one input file.
type FileOutcome = (Vec<AggregationRecord>, Vec<SkippedItem>);

pub struct TemporalAggregationPipeline {
    config: ProductConfig,
    clipper: RasterClipper,
    aggregator: MaskedAggregator,
}

impl TemporalAggregationPipeline {
    pub fn new(config: ProductConfig) -> Self {
        let aggregator = MaskedAggregator::new(config.statistic);
        Self {
            config,
            clipper: RasterClipper::new(),
            aggregator,
        }
    }

    pub fn config(&self) -> &ProductConfig {
        &self.config
    }

    /// Load the boundary catalog and the acceptable quality codes.
    pub fn load_references(&self) -> Result<References, ReferenceLoadError> {
        let catalog = BoundaryCatalog::load(&self.config.inputs.boundary, &self.config.boundary_fields)?;
        let codes = self
            .config
            .quality
            .engine()
            .evaluate_path(&self.config.inputs.quality_table)?;

        if codes.is_empty() {
            warn!(
                table = %self.config.inputs.quality_table.display(),
                "No quality code passes the rules, every aggregate will be missing"
            );
        }

        Ok(References {
            catalog,
            codes: Arc::new(codes),
        })
    }

    /// Value layers in the input directory, sorted by file name.
    pub fn discover_inputs(&self) -> Result<Vec<InputPair>, PipelineError> {
        let inputs = &self.config.inputs;
        let listing_error = |message: String| PipelineError::InputListing {
            path: inputs.dir.display().to_string(),
            message,
        };

        let mut values = Vec::new();
        for entry in WalkDir::new(&inputs.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| listing_error(e.to_string()))?;
            // Follows symlinked layers
            if !entry.path().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if name.starts_with(&inputs.value_prefix) && name.ends_with(&inputs.suffix) {
                values.push(entry.into_path());
            }
        }
        values.sort_by_key(|p| file_name(p));

        let pairs = values
            .into_iter()
            .map(|value| {
                let quality = inputs
                    .quality_pairing
                    .quality_name(&file_name(&value))
                    .map(|name| value.with_file_name(name));
                InputPair { value, quality }
            })
            .collect::<Vec<_>>();

        info!(
            dir = %inputs.dir.display(),
            prefix = %inputs.value_prefix,
            files = pairs.len(),
            "Discovered input layers"
        );
        Ok(pairs)
    }

    /// Full run: load references, discover inputs, aggregate, impute, sort.
    pub fn run(&self) -> Result<TimeSeriesResult, PipelineError> {
        let start = Instant::now();
        let references = self.load_references()?;
        let inputs = self.discover_inputs()?;
        let result = self.process(&references, &inputs);

        info!(
            product = %self.config.product.id,
            files = result.summary.files_seen,
            rows = result.summary.rows_emitted,
            imputed = result.summary.rows_imputed,
            missing = result.summary.rows_missing,
            skipped = result.summary.skipped.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Aggregation run complete"
        );
        Ok(result)
    }

    /// Aggregate every (file, region) pair, then impute and sort.
    ///
    /// Rows are collected in input order before sorting, so the result does
    /// not depend on thread count or scheduling.
    pub fn process(&self, references: &References, inputs: &[InputPair]) -> TimeSeriesResult {
        let outcomes: Vec<FileOutcome> = inputs
            .par_iter()
            .map(|input| self.process_file(references, input))
            .collect();

        let mut records = Vec::new();
        let mut skipped = Vec::new();
        for (file_records, file_skips) in outcomes {
            records.extend(file_records);
            skipped.extend(file_skips);
        }

        let rows_imputed = self.config.impute.apply(&mut records);
        sort_by_region(&mut records);

        let summary = RunSummary {
            files_seen: inputs.len(),
            regions: references.catalog.len(),
            rows_emitted: records.len(),
            rows_missing: records.iter().filter(|r| r.is_missing()).count(),
            rows_imputed,
            skipped,
        };

        TimeSeriesResult { records, summary }
    }

    fn process_file(&self, references: &References, input: &InputPair) -> FileOutcome {
        let name = input.name();
        let skip_file = |reason: String| {
            warn!(file = %name, reason = %reason, "Skipping file");
            (
                Vec::new(),
                vec![SkippedItem {
                    file: name.clone(),
                    region: None,
                    reason,
                }],
            )
        };

        let date = match AcquisitionDate::from_filename(&input.value) {
            Ok(date) => date,
            Err(e) => return skip_file(e.to_string()),
        };

        let quality_path = match &input.quality {
            Some(path) if path.is_file() => path,
            Some(path) => return skip_file(format!("quality layer not found: {}", path.display())),
            None => {
                return skip_file(format!(
                    "file name does not contain '{}'",
                    self.config.inputs.quality_pairing.from
                ))
            }
        };

        let (values, quality) = match self.read_pair(&input.value, quality_path) {
            Ok(pair) => pair,
            Err(e) => return skip_file(e.to_string()),
        };

        let scaler = ValueScaler::for_grid(&values, self.config.nodata, self.config.scale);
        debug!(
            file = %name,
            date = %date,
            nodata = ?scaler.nodata,
            scale_factor = scaler.scale_factor,
            "Aggregating file"
        );

        let results: Vec<Result<AggregationRecord, SkippedItem>> = references
            .catalog
            .regions()
            .par_iter()
            .map(|region| {
                self.aggregate_region(&values, &quality, &scaler, &references.codes, region, date)
                    .map_err(|reason| {
                        warn!(file = %name, region = %region.id, reason = %reason, "Skipping region");
                        SkippedItem {
                            file: name.clone(),
                            region: Some(region.id.clone()),
                            reason,
                        }
                    })
            })
            .collect();

        let mut records = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for result in results {
            match result {
                Ok(record) => records.push(record),
                Err(skip) => skipped.push(skip),
            }
        }
        (records, skipped)
    }

    fn read_pair(&self, value_path: &Path, quality_path: &Path) -> Result<(RasterGrid, RasterGrid), String> {
        let values = read_geotiff(value_path).map_err(|e| e.to_string())?;
        let quality = read_geotiff(quality_path).map_err(|e| e.to_string())?;
        self.clipper
            .check_co_registered(&values, &quality)
            .map_err(|e| e.to_string())?;
        Ok((values, quality))
    }

    fn aggregate_region(
        &self,
        values: &RasterGrid,
        quality: &RasterGrid,
        scaler: &ValueScaler,
        codes: &QualityCodeSet,
        region: &BoundaryRegion,
        date: AcquisitionDate,
    ) -> Result<AggregationRecord, String> {
        let clipped_values = self.clipper.clip(values, region).map_err(|e| e.to_string())?;
        let clipped_quality = self.clipper.clip(quality, region).map_err(|e| e.to_string())?;
        let scaled = scaler.scale(&clipped_values.grid.data);

        let value = self
            .aggregator
            .aggregate(&scaled, &clipped_quality.grid.data, &clipped_values.inside, codes)
            .map_err(|e| e.to_string())?;

        Ok(AggregationRecord {
            date,
            value,
            region_id: region.id.clone(),
            region_name: region.name.clone(),
            imputed: false,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

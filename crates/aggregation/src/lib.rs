//! Per-region, per-timestamp aggregation of quality-filtered rasters.
//!
//! A [`TemporalAggregationPipeline`] walks a directory of value/quality
//! GeoTIFF pairs, clips every pair to every boundary region, keeps pixels
//! whose quality code is acceptable and reduces them to one statistic per
//! (date, region). Missing aggregates are imputed by policy, rows are
//! sorted by region and the table is written as CSV.

pub mod aggregate;
pub mod config;
pub mod impute;
pub mod output;
pub mod pipeline;
pub mod record;

pub use aggregate::{MaskedAggregator, Statistic};
pub use config::ProductConfig;
pub use quality::{QualityConfig, QualityPairing, QualityPreset};
pub use impute::{sort_by_region, ImputePolicy};
pub use output::{write_csv, CSV_HEADER};
pub use pipeline::{InputPair, References, TemporalAggregationPipeline};
pub use record::{AggregationRecord, RunSummary, SkippedItem, TimeSeriesResult};

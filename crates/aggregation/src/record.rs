//! Rows of the aggregated table and the run summary.

use serde::Serialize;

use boundary::RegionId;
use raster_common::AcquisitionDate;

/// One (date, region) aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationRecord {
    pub date: AcquisitionDate,
    /// Statistic of the retained pixels, NaN when none were retained
    pub value: f64,
    pub region_id: RegionId,
    pub region_name: String,
    /// Whether `value` was filled in by the impute policy
    pub imputed: bool,
}

impl AggregationRecord {
    pub fn is_missing(&self) -> bool {
        self.value.is_nan()
    }
}

/// An input that produced no row, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub file: String,
    /// `None` when the whole file was skipped
    pub region: Option<RegionId>,
    pub reason: String,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub files_seen: usize,
    pub regions: usize,
    pub rows_emitted: usize,
    /// Rows still missing after imputation
    pub rows_missing: usize,
    pub rows_imputed: usize,
    pub skipped: Vec<SkippedItem>,
}

/// The sorted table plus its summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeriesResult {
    pub records: Vec<AggregationRecord>,
    pub summary: RunSummary,
}

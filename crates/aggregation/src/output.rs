//! CSV output of the aggregated table.
//!
//! Written to a temporary file in the destination directory and renamed
//! into place, so readers never observe a partial table.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use raster_common::PipelineError;

use crate::record::AggregationRecord;

pub const CSV_HEADER: [&str; 4] = ["Date", "Value", "RegionId", "RegionName"];

/// Write `records` as `Date,Value,RegionId,RegionName`.
///
/// Missing values are written as empty cells.
pub fn write_csv(path: impl AsRef<Path>, records: &[AggregationRecord]) -> Result<(), PipelineError> {
    let path = path.as_ref();
    let output_error = |message: String| PipelineError::Output {
        path: path.display().to_string(),
        message,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| output_error(e.to_string()))?;

    write_records(&mut tmp, records).map_err(|e| output_error(e.to_string()))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| output_error(e.to_string()))?;
    tmp.persist(path).map_err(|e| output_error(e.error.to_string()))?;

    info!(path = %path.display(), rows = records.len(), "Wrote aggregation table");
    Ok(())
}

fn write_records<W: Write>(writer: W, records: &[AggregationRecord]) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for record in records {
        let value = if record.is_missing() {
            String::new()
        } else {
            record.value.to_string()
        };
        csv.write_record([
            record.date.us_format().as_str(),
            value.as_str(),
            record.region_id.as_str(),
            record.region_name.as_str(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

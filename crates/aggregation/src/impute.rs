//! Missing-aggregate imputation and final ordering.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::record::AggregationRecord;

/// How missing aggregates are filled before the table is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputePolicy {
    /// Replace missing values with the mean of every non-missing aggregate
    #[default]
    GlobalMean,
    /// Leave missing values in place
    None,
}

impl ImputePolicy {
    /// Apply the policy in place, returning the number of rows filled.
    pub fn apply(&self, records: &mut [AggregationRecord]) -> usize {
        match self {
            Self::None => 0,
            Self::GlobalMean => impute_global_mean(records),
        }
    }
}

fn impute_global_mean(records: &mut [AggregationRecord]) -> usize {
    let missing = records.iter().filter(|r| r.is_missing()).count();
    if missing == 0 {
        return 0;
    }

    let (sum, count) = records
        .iter()
        .filter(|r| !r.is_missing())
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.value, count + 1));

    if count == 0 {
        warn!(
            missing,
            "Every aggregate is missing, nothing to impute from"
        );
        return 0;
    }

    let mean = sum / count as f64;
    for record in records.iter_mut().filter(|r| r.is_missing()) {
        record.value = mean;
        record.imputed = true;
    }

    info!(imputed = missing, mean, "Imputed missing aggregates with global mean");
    missing
}

/// Stable sort by region id; rows of one region keep their input order.
pub fn sort_by_region(records: &mut [AggregationRecord]) {
    records.sort_by(|a, b| a.region_id.cmp(&b.region_id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundary::RegionId;
    use raster_common::AcquisitionDate;

    fn record(region: &str, doy: u32, value: f64) -> AggregationRecord {
        AggregationRecord {
            date: AcquisitionDate::from_year_doy(2020, doy).unwrap(),
            value,
            region_id: RegionId::new(region),
            region_name: format!("Region {}", region),
            imputed: false,
        }
    }

    #[test]
    fn test_global_mean_fills_missing() {
        let mut records = vec![record("1", 1, 2.0), record("2", 1, f64::NAN), record("3", 1, 4.0)];
        assert_eq!(ImputePolicy::GlobalMean.apply(&mut records), 1);
        assert_eq!(records[1].value, 3.0);
        assert!(records[1].imputed);
        assert!(!records[0].imputed);
    }

    #[test]
    fn test_all_missing_left_alone() {
        let mut records = vec![record("1", 1, f64::NAN), record("2", 1, f64::NAN)];
        assert_eq!(ImputePolicy::GlobalMean.apply(&mut records), 0);
        assert!(records.iter().all(|r| r.is_missing() && !r.imputed));
    }

    #[test]
    fn test_policy_none() {
        let mut records = vec![record("1", 1, 2.0), record("2", 1, f64::NAN)];
        assert_eq!(ImputePolicy::None.apply(&mut records), 0);
        assert!(records[1].is_missing());
    }

    #[test]
    fn test_sort_is_stable_within_region() {
        let mut records = vec![
            record("10", 1, 1.0),
            record("9", 1, 2.0),
            record("10", 17, 3.0),
            record("9", 17, 4.0),
        ];
        sort_by_region(&mut records);

        let order: Vec<(&str, u32)> = records
            .iter()
            .map(|r| (r.region_id.as_str(), r.date.day_of_year()))
            .collect();
        assert_eq!(order, vec![("9", 1), ("9", 17), ("10", 1), ("10", 17)]);
    }
}

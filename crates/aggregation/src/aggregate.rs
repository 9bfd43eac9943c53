//! Reduction of a masked grid to one statistic.

use serde::{Deserialize, Serialize};

use quality::QualityCodeSet;
use raster_common::{RasterClipError, MISSING};

/// Statistic computed over the retained pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    #[default]
    Mean,
    Median,
    Min,
    Max,
}

impl Statistic {
    /// Reduce finite values. `None` when there are none.
    pub fn compute(&self, values: &mut [f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let result = match self {
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Median => {
                values.sort_by(f64::total_cmp);
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                }
            }
        };
        Some(result)
    }
}

/// Applies the inside mask and quality codes, then reduces.
///
/// A pixel is retained when it lies inside the region, its quality code is
/// in the acceptable set and its scaled value is not missing. No retained
/// pixels yields the missing sentinel.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaskedAggregator {
    pub statistic: Statistic,
}

impl MaskedAggregator {
    pub fn new(statistic: Statistic) -> Self {
        Self { statistic }
    }

    pub fn aggregate(
        &self,
        values: &[f64],
        quality: &[f64],
        inside: &[bool],
        codes: &QualityCodeSet,
    ) -> Result<f64, RasterClipError> {
        if values.len() != quality.len() || values.len() != inside.len() {
            return Err(RasterClipError::ShapeMismatch {
                left: (values.len(), 1),
                right: (quality.len(), 1),
            });
        }

        let mut retained: Vec<f64> = values
            .iter()
            .zip(quality)
            .zip(inside)
            .filter(|((value, code), inside)| {
                **inside && !value.is_nan() && codes.contains_value(**code)
            })
            .map(|((value, _), _)| *value)
            .collect();

        Ok(self.statistic.compute(&mut retained).unwrap_or(MISSING))
    }
}

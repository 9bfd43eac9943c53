//! Conversion of raw product integers to physical values.

use serde::{Deserialize, Serialize};

use raster_common::{RasterGrid, MISSING};

use crate::clip::ClippedGrid;

/// Where the scale factor comes from.
///
/// ```yaml
/// scale: { source: metadata, default: 1.0 }
/// scale: { source: fixed, value: 0.0001 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ScaleSource {
    /// `scale_factor` from the file's metadata, `default` when absent
    Metadata {
        #[serde(default = "default_scale")]
        default: f64,
    },
    Fixed { value: f64 },
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ScaleSource {
    fn default() -> Self {
        Self::Metadata {
            default: default_scale(),
        }
    }
}

impl ScaleSource {
    /// Metadata scale factors that are not finite and positive are ignored.
    pub fn resolve(&self, grid: &RasterGrid) -> f64 {
        match *self {
            Self::Metadata { default } => grid
                .scale_factor
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(default),
            Self::Fixed { value } => value,
        }
    }
}

/// Where the nodata value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NodataSource {
    /// The nodata value declared by the file
    #[default]
    Metadata,
    Fixed { value: f64 },
    /// Every value is data
    None,
}

impl NodataSource {
    pub fn resolve(&self, grid: &RasterGrid) -> Option<f64> {
        match *self {
            Self::Metadata => grid.nodata,
            Self::Fixed { value } => Some(value),
            Self::None => None,
        }
    }
}

/// Maps raw cells to `raw * scale_factor`, nodata and NaN to [`MISSING`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScaler {
    pub nodata: Option<f64>,
    pub scale_factor: f64,
}

impl ValueScaler {
    pub fn new(nodata: Option<f64>, scale_factor: f64) -> Self {
        Self {
            nodata,
            scale_factor,
        }
    }

    /// Scaler for a grid, resolving nodata and scale from their sources.
    pub fn for_grid(grid: &RasterGrid, nodata: NodataSource, scale: ScaleSource) -> Self {
        Self::new(nodata.resolve(grid), scale.resolve(grid))
    }

    #[inline]
    pub fn scale_value(&self, raw: f64) -> f64 {
        if raw.is_nan() || self.is_nodata(raw) {
            MISSING
        } else {
            raw * self.scale_factor
        }
    }

    #[inline]
    fn is_nodata(&self, raw: f64) -> bool {
        match self.nodata {
            Some(nodata) if nodata.is_nan() => raw.is_nan(),
            Some(nodata) => raw == nodata,
            None => false,
        }
    }

    pub fn scale(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter().map(|v| self.scale_value(*v)).collect()
    }

    /// Scaled copy of a grid. The copy declares no nodata, NaN marks it.
    pub fn scale_grid(&self, grid: &RasterGrid) -> RasterGrid {
        RasterGrid {
            data: self.scale(&grid.data),
            nodata: None,
            ..grid.clone()
        }
    }

    /// Scaled copy of a clipped grid, keeping its inside mask.
    pub fn scale_clipped(&self, clipped: &ClippedGrid) -> ClippedGrid {
        ClippedGrid {
            grid: self.scale_grid(&clipped.grid),
            inside: clipped.inside.clone(),
            window: clipped.window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::GeoTransform;

    fn grid(data: Vec<f64>) -> RasterGrid {
        let n = data.len();
        RasterGrid::new(n, 1, data, GeoTransform::default()).unwrap()
    }

    #[test]
    fn test_nodata_becomes_missing() {
        let scaler = ValueScaler::new(Some(-3000.0), 0.0001);
        let out = scaler.scale(&[-3000.0, 5000.0, 0.0]);
        assert!(out[0].is_nan());
        assert!((out[1] - 0.5).abs() < 1e-12);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn test_nan_raw_stays_missing() {
        let scaler = ValueScaler::new(None, 2.0);
        assert!(scaler.scale_value(f64::NAN).is_nan());
        assert_eq!(scaler.scale_value(3.0), 6.0);
    }

    #[test]
    fn test_sources_resolve() {
        let g = grid(vec![1.0]).with_nodata(Some(0.0)).with_scale_factor(Some(0.01));

        assert_eq!(ScaleSource::default().resolve(&g), 0.01);
        assert_eq!(ScaleSource::Fixed { value: 2.0 }.resolve(&g), 2.0);
        assert_eq!(ScaleSource::default().resolve(&grid(vec![1.0])), 1.0);
        let negative = grid(vec![1.0]).with_scale_factor(Some(-0.01));
        assert_eq!(ScaleSource::default().resolve(&negative), 1.0);

        assert_eq!(NodataSource::Metadata.resolve(&g), Some(0.0));
        assert_eq!(NodataSource::Fixed { value: -1.0 }.resolve(&g), Some(-1.0));
        assert_eq!(NodataSource::None.resolve(&g), None);
    }

    #[test]
    fn test_scale_grid_drops_declared_nodata() {
        let g = grid(vec![-1.0, 4.0]).with_nodata(Some(-1.0));
        let scaled = ValueScaler::for_grid(&g, NodataSource::Metadata, ScaleSource::Fixed { value: 0.5 })
            .scale_grid(&g);
        assert!(scaled.data[0].is_nan());
        assert_eq!(scaled.data[1], 2.0);
        assert_eq!(scaled.nodata, None);
        assert_eq!(scaled.shape(), g.shape());
    }
}

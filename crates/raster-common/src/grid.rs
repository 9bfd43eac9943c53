//! Raster grid types shared by the clip, scale, aggregate and render stages.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::BoundingBox;

/// Sentinel for "no reliable value". Distinct from a measured zero.
pub const MISSING: f64 = f64::NAN;

/// Check whether a value is the missing sentinel.
#[inline]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Affine transform from pixel (col, row) to coordinates (x, y).
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// North-up rasters have zero rotation and a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Usually negative
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a north-up transform.
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Coordinates of the pixel center.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Coordinates of the pixel's upper-left corner.
    pub fn pixel_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64, row as f64)
    }

    /// Fractional pixel coordinates (col, row) of a point.
    ///
    /// Returns NaN for a degenerate transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det.abs() < 1e-15 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;
        (col, row)
    }

    /// Transform for a sub-window starting at (col, row).
    pub fn shifted(&self, col: usize, row: usize) -> Self {
        let (origin_x, origin_y) = self.pixel_corner(col, row);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }

    fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

/// Coordinate reference system identified by EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Crs(pub u32);

impl Crs {
    pub const WGS84: Crs = Crs(4326);

    /// Parse "EPSG:4326", "epsg:4326", "urn:ogc:def:crs:EPSG::4326" or
    /// "CRS:84" / "urn:ogc:def:crs:OGC:1.3:CRS84".
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        if upper == "CRS:84" || upper.ends_with("CRS84") {
            return Some(Self::WGS84);
        }
        if !upper.contains("EPSG") {
            return None;
        }
        upper
            .rsplit(':')
            .next()
            .and_then(|code| code.parse::<u32>().ok())
            .map(Crs)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// A single-band raster held in memory, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
    /// Declared nodata value of the source band
    pub nodata: Option<f64>,
    pub transform: GeoTransform,
    pub crs: Option<Crs>,
    /// `scale_factor` from source metadata, if declared
    pub scale_factor: Option<f64>,
}

impl RasterGrid {
    /// Create a grid; returns `None` when `data` does not match the shape.
    pub fn new(width: usize, height: usize, data: Vec<f64>, transform: GeoTransform) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
            nodata: None,
            transform,
            crs: None,
            scale_factor: None,
        })
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn with_crs(mut self, crs: Option<Crs>) -> Self {
        self.crs = crs;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: Option<f64>) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data.get(row * self.width + col).copied()
    }

    /// Extent covered by the grid cells.
    pub fn bbox(&self) -> BoundingBox {
        let corners = [
            self.transform.pixel_corner(0, 0),
            self.transform.pixel_corner(self.width, 0),
            self.transform.pixel_corner(0, self.height),
            self.transform.pixel_corner(self.width, self.height),
        ];

        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in corners {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_center_and_inverse() {
        let gt = GeoTransform::new(-125.0, 42.0, 0.5, -0.5);

        let (x, y) = gt.pixel_center(2, 3);
        assert!((x - -123.75).abs() < 1e-12);
        assert!((y - 40.25).abs() < 1e-12);

        let (col, row) = gt.geo_to_pixel(x, y);
        assert!((col - 2.5).abs() < 1e-12);
        assert!((row - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_shifted_window_origin() {
        let gt = GeoTransform::new(0.0, 10.0, 1.0, -1.0);
        let shifted = gt.shifted(3, 2);
        assert_eq!(shifted.origin_x, 3.0);
        assert_eq!(shifted.origin_y, 8.0);
        assert_eq!(shifted.pixel_width, 1.0);
    }

    #[test]
    fn test_grid_bbox() {
        let grid = RasterGrid::new(4, 2, vec![0.0; 8], GeoTransform::new(10.0, 20.0, 0.5, -0.5)).unwrap();
        assert_eq!(grid.bbox(), BoundingBox::new(10.0, 19.0, 12.0, 20.0));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        assert!(RasterGrid::new(3, 3, vec![0.0; 8], GeoTransform::default()).is_none());
    }

    #[test]
    fn test_crs_parse() {
        assert_eq!(Crs::parse("EPSG:4326"), Some(Crs(4326)));
        assert_eq!(Crs::parse("urn:ogc:def:crs:EPSG::3310"), Some(Crs(3310)));
        assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(Crs::WGS84));
        assert_eq!(Crs::parse("not a crs"), None);
        assert_eq!(Crs(3857).to_string(), "EPSG:3857");
    }

    #[test]
    fn test_missing_sentinel() {
        assert!(is_missing(MISSING));
        assert!(!is_missing(0.0));
    }
}

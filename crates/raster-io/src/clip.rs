//! Clip a raster to one boundary region.
//!
//! The grid is cropped to the region's bounding extent, rounded outward to
//! whole cells and intersected with the raster extent. A cell is inside
//! the region when its center lies inside the polygon.

use tracing::trace;

use boundary::BoundaryRegion;
use raster_common::{BoundingBox, RasterClipError, RasterGrid};

/// Pixel window of a crop, in source grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

/// A grid cropped to a region's extent with its inside mask.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedGrid {
    pub grid: RasterGrid,
    /// Row-major, `true` where the cell center lies inside the region
    pub inside: Vec<bool>,
    pub window: Window,
}

impl ClippedGrid {
    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    pub fn inside_count(&self) -> usize {
        self.inside.iter().filter(|i| **i).count()
    }
}

/// Clips rasters to boundary regions.
#[derive(Debug, Clone, Copy)]
pub struct RasterClipper {
    /// Tolerance when comparing the transforms of paired grids
    pub transform_tolerance: f64,
}

impl RasterClipper {
    pub fn new() -> Self {
        Self {
            transform_tolerance: 1e-9,
        }
    }

    /// Crop `grid` to `region` and mask cells outside it.
    pub fn clip(&self, grid: &RasterGrid, region: &BoundaryRegion) -> Result<ClippedGrid, RasterClipError> {
        if let (Some(raster), Some(boundary)) = (grid.crs, region.crs) {
            if raster != boundary {
                return Err(RasterClipError::CrsMismatch {
                    raster: raster.to_string(),
                    boundary: boundary.to_string(),
                });
            }
        }

        let no_overlap = || RasterClipError::NoOverlap {
            region: region.id.to_string(),
        };

        let region_bbox = region.bbox().ok_or_else(no_overlap)?;
        if !grid.bbox().intersects(&region_bbox) {
            return Err(no_overlap());
        }

        let window = pixel_window(grid, &region_bbox).ok_or_else(no_overlap)?;
        let transform = grid.transform.shifted(window.col_off, window.row_off);

        let mut data = Vec::with_capacity(window.width * window.height);
        let mut inside = Vec::with_capacity(window.width * window.height);
        for row in 0..window.height {
            let src_row = window.row_off + row;
            let start = src_row * grid.width + window.col_off;
            data.extend_from_slice(&grid.data[start..start + window.width]);

            for col in 0..window.width {
                let (x, y) = transform.pixel_center(col, row);
                inside.push(region.contains(x, y));
            }
        }

        let clipped = RasterGrid {
            width: window.width,
            height: window.height,
            data,
            nodata: grid.nodata,
            transform,
            crs: grid.crs,
            scale_factor: grid.scale_factor,
        };

        trace!(
            region = %region.id,
            ?window,
            inside = inside.iter().filter(|i| **i).count(),
            "Clipped raster"
        );

        Ok(ClippedGrid {
            grid: clipped,
            inside,
            window,
        })
    }

    /// Fail unless both grids share shape and georeferencing.
    pub fn check_co_registered(&self, left: &RasterGrid, right: &RasterGrid) -> Result<(), RasterClipError> {
        let mismatch = || RasterClipError::ShapeMismatch {
            left: left.shape(),
            right: right.shape(),
        };

        if left.shape() != right.shape() {
            return Err(mismatch());
        }

        let (a, b) = (&left.transform, &right.transform);
        let close = |x: f64, y: f64| (x - y).abs() <= self.transform_tolerance;
        let aligned = close(a.origin_x, b.origin_x)
            && close(a.origin_y, b.origin_y)
            && close(a.pixel_width, b.pixel_width)
            && close(a.pixel_height, b.pixel_height)
            && close(a.row_rotation, b.row_rotation)
            && close(a.col_rotation, b.col_rotation);
        if !aligned {
            return Err(mismatch());
        }
        Ok(())
    }
}

impl Default for RasterClipper {
    fn default() -> Self {
        Self::new()
    }
}

/// Cells covering `bbox`, rounded outward and clamped to the grid.
fn pixel_window(grid: &RasterGrid, bbox: &BoundingBox) -> Option<Window> {
    let corners = [
        (bbox.min_x, bbox.min_y),
        (bbox.min_x, bbox.max_y),
        (bbox.max_x, bbox.min_y),
        (bbox.max_x, bbox.max_y),
    ];

    let mut col_min = f64::INFINITY;
    let mut col_max = f64::NEG_INFINITY;
    let mut row_min = f64::INFINITY;
    let mut row_max = f64::NEG_INFINITY;
    for (x, y) in corners {
        let (col, row) = grid.transform.geo_to_pixel(x, y);
        if col.is_nan() || row.is_nan() {
            return None;
        }
        col_min = col_min.min(col);
        col_max = col_max.max(col);
        row_min = row_min.min(row);
        row_max = row_max.max(row);
    }

    let clamp = |v: f64, max: usize| v.max(0.0).min(max as f64) as usize;
    let col_start = clamp(col_min.floor(), grid.width);
    let col_end = clamp(col_max.ceil(), grid.width);
    let row_start = clamp(row_min.floor(), grid.height);
    let row_end = clamp(row_max.ceil(), grid.height);

    if col_end <= col_start || row_end <= row_start {
        return None;
    }

    Some(Window {
        col_off: col_start,
        row_off: row_start,
        width: col_end - col_start,
        height: row_end - row_start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundary::RegionId;
    use geo::{polygon, MultiPolygon};
    use raster_common::{Crs, GeoTransform};

    fn unit_grid(width: usize, height: usize) -> RasterGrid {
        let data = (0..width * height).map(|i| i as f64).collect();
        RasterGrid::new(width, height, data, GeoTransform::new(0.0, height as f64, 1.0, -1.0)).unwrap()
    }

    fn rect_region(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundaryRegion {
        BoundaryRegion {
            id: RegionId::new("1"),
            name: "Test".to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x1, y: y0),
                (x: x1, y: y1),
                (x: x0, y: y1),
                (x: x0, y: y0),
            ]]),
            crs: None,
        }
    }

    #[test]
    fn test_window_aligned_to_cells() {
        let grid = unit_grid(4, 4);
        let clipped = RasterClipper::new().clip(&grid, &rect_region(1.0, 1.0, 3.0, 3.0)).unwrap();

        assert_eq!(
            clipped.window,
            Window { col_off: 1, row_off: 1, width: 2, height: 2 }
        );
        assert_eq!(clipped.grid.data, vec![5.0, 6.0, 9.0, 10.0]);
        assert_eq!(clipped.inside_count(), 4);
        assert_eq!(clipped.grid.transform.origin_x, 1.0);
        assert_eq!(clipped.grid.transform.origin_y, 3.0);
    }

    #[test]
    fn test_window_rounds_outward() {
        let grid = unit_grid(4, 4);
        let clipped = RasterClipper::new().clip(&grid, &rect_region(0.6, 0.6, 1.4, 1.4)).unwrap();

        assert_eq!(clipped.window.width, 2);
        assert_eq!(clipped.window.height, 2);
        // No cell center falls inside the small square
        assert_eq!(clipped.inside_count(), 0);
    }

    #[test]
    fn test_triangle_masks_by_center() {
        let grid = unit_grid(4, 4);
        let region = BoundaryRegion {
            id: RegionId::new("7"),
            name: "Triangle".to_string(),
            geometry: MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 4.0, y: 0.0),
                (x: 0.0, y: 4.0),
                (x: 0.0, y: 0.0),
            ]]),
            crs: None,
        };

        let clipped = RasterClipper::new().clip(&grid, &region).unwrap();
        assert_eq!(clipped.shape(), (4, 4));
        // Centers with x + y < 4 are inside: 4 + 3 + 2 + 1 minus the diagonal
        assert_eq!(clipped.inside_count(), 6);
        assert!(clipped.inside[12]); // bottom-left cell
        assert!(!clipped.inside[3]); // top-right cell
    }

    #[test]
    fn test_partial_overlap_is_clamped() {
        let grid = unit_grid(4, 4);
        let clipped = RasterClipper::new().clip(&grid, &rect_region(2.0, -5.0, 10.0, 2.0)).unwrap();
        assert_eq!(
            clipped.window,
            Window { col_off: 2, row_off: 2, width: 2, height: 2 }
        );
    }

    #[test]
    fn test_disjoint_region() {
        let grid = unit_grid(4, 4);
        let err = RasterClipper::new().clip(&grid, &rect_region(10.0, 10.0, 12.0, 12.0)).unwrap_err();
        assert!(matches!(err, RasterClipError::NoOverlap { region } if region == "1"));
    }

    #[test]
    fn test_crs_mismatch() {
        let grid = unit_grid(4, 4).with_crs(Some(Crs(32611)));
        let mut region = rect_region(1.0, 1.0, 3.0, 3.0);
        region.crs = Some(Crs::WGS84);
        assert!(matches!(
            RasterClipper::new().clip(&grid, &region),
            Err(RasterClipError::CrsMismatch { .. })
        ));
    }

    #[test]
    fn test_pair_shape_mismatch() {
        let clipper = RasterClipper::new();
        let err = clipper
            .check_co_registered(&unit_grid(4, 4), &unit_grid(3, 4))
            .unwrap_err();
        assert!(matches!(
            err,
            RasterClipError::ShapeMismatch { left: (4, 4), right: (4, 3) }
        ));
    }

    #[test]
    fn test_pair_transform_mismatch() {
        let values = unit_grid(4, 4);
        let mut quality = unit_grid(4, 4);
        quality.transform.origin_x += 0.5;
        assert!(RasterClipper::new().check_co_registered(&values, &quality).is_err());
    }
}

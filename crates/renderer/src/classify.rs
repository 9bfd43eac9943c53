//! Pixel classification of a clipped, scaled grid.

use image::RgbImage;
use rayon::prelude::*;

use raster_common::RenderTaskError;
use raster_io::ClippedGrid;

use crate::style::ColorBreakpointTable;

/// Color every cell of a clipped grid, one row per rayon task.
///
/// Cells outside the region take the background color. Cells whose
/// `accepted` flag is false take the unknown color. Everything else goes
/// through the breakpoint table.
pub fn classify(
    clipped: &ClippedGrid,
    table: &ColorBreakpointTable,
    accepted: Option<&[bool]>,
) -> Result<RgbImage, RenderTaskError> {
    let width = clipped.grid.width;
    let height = clipped.grid.height;
    let cells = width * height;

    if clipped.inside.len() != cells || accepted.is_some_and(|a| a.len() != cells) {
        return Err(RenderTaskError::Encode(format!(
            "mask length does not match a {}x{} grid",
            width, height
        )));
    }

    let mut buffer = vec![0u8; cells * 3];
    if cells > 0 {
        buffer
            .par_chunks_mut(width * 3)
            .enumerate()
            .for_each(|(row, pixels)| {
                let start = row * width;
                for (col, pixel) in pixels.chunks_exact_mut(3).enumerate() {
                    let idx = start + col;
                    let color = if !clipped.inside[idx] {
                        table.background()
                    } else if accepted.is_some_and(|a| !a[idx]) {
                        table.unknown()
                    } else {
                        table.color_for(clipped.grid.data[idx])
                    };
                    pixel.copy_from_slice(&color.0);
                }
            });
    }

    RgbImage::from_raw(width as u32, height as u32, buffer)
        .ok_or_else(|| RenderTaskError::Encode(format!("{}x{} buffer size mismatch", width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{BreakpointEntry, StyleDefinition};
    use image::Rgb;
    use raster_common::{GeoTransform, RasterGrid};
    use raster_io::Window;

    fn table() -> ColorBreakpointTable {
        ColorBreakpointTable::from_definition(&StyleDefinition {
            name: "codes".to_string(),
            description: None,
            units: None,
            background: "#000000".to_string(),
            unknown: "#FFFFFF".to_string(),
            entries: vec![
                BreakpointEntry::Exact { value: 3.0, color: "#0000FF".to_string() },
                BreakpointEntry::Range { min: Some(7.0), max: Some(9.0), color: "#FF0000".to_string() },
            ],
        })
        .unwrap()
    }

    fn clipped(data: Vec<f64>, inside: Vec<bool>) -> ClippedGrid {
        let grid = RasterGrid::new(2, 2, data, GeoTransform::new(0.0, 2.0, 1.0, -1.0)).unwrap();
        ClippedGrid {
            grid,
            inside,
            window: Window { col_off: 0, row_off: 0, width: 2, height: 2 },
        }
    }

    #[test]
    fn test_classes_and_background() {
        let c = clipped(vec![3.0, 8.0, 1.0, 3.0], vec![true, true, true, false]);
        let img = classify(&c, &table(), None).unwrap();

        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgb([255, 0, 0]));
        assert_eq!(*img.get_pixel(0, 1), Rgb([0, 0, 0]));
        // outside the region
        assert_eq!(*img.get_pixel(1, 1), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_missing_and_rejected_are_unknown() {
        let c = clipped(vec![f64::NAN, 8.0, 3.0, 3.0], vec![true; 4]);
        let accepted = [true, false, true, true];
        let img = classify(&c, &table(), Some(&accepted)).unwrap();

        assert_eq!(*img.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(1, 0), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(0, 1), Rgb([0, 0, 255]));
    }

    #[test]
    fn test_mask_length_mismatch() {
        let c = clipped(vec![3.0; 4], vec![true; 4]);
        assert!(classify(&c, &table(), Some(&[true])).is_err());
    }
}

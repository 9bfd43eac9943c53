//! Rendered frames and their atomic PNG output.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use raster_common::{AcquisitionDate, RenderTaskError};

/// A classified image and the label derived from its source file.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub image: RgbImage,
    pub date: AcquisitionDate,
    pub label: String,
    /// Source raster the frame was rendered from
    pub source: PathBuf,
}

impl RenderedFrame {
    /// `<source stem>.png`
    pub fn file_name(&self) -> String {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame".to_string());
        format!("{}.png", stem)
    }

    /// Encode the frame as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, RenderTaskError> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                self.image.as_raw(),
                self.image.width(),
                self.image.height(),
                ColorType::Rgb8,
            )
            .map_err(|e| RenderTaskError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Write `<stem>.png` into `dir` via a temp file and rename, so readers
    /// never observe a partial image.
    pub fn write_atomic(&self, dir: &Path) -> Result<PathBuf, RenderTaskError> {
        let target = dir.join(self.file_name());
        let write_error = |source: std::io::Error| RenderTaskError::Write {
            path: target.display().to_string(),
            source,
        };

        let png = self.encode_png()?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
        tmp.write_all(&png).map_err(write_error)?;
        tmp.as_file().sync_all().map_err(write_error)?;
        tmp.persist(&target).map_err(|e| write_error(e.error))?;

        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn frame(source: &str) -> RenderedFrame {
        RenderedFrame {
            image: RgbImage::from_pixel(3, 2, Rgb([10, 20, 30])),
            date: AcquisitionDate::from_year_doy(2020, 1).unwrap(),
            label: "Year: 2020, Day: 001".to_string(),
            source: PathBuf::from(source),
        }
    }

    #[test]
    fn test_file_name_from_stem() {
        let f = frame("raw/EVI/MOD13A1.061__500m_16_days_EVI_doy2020001_aid0001.tif");
        assert_eq!(f.file_name(), "MOD13A1.061__500m_16_days_EVI_doy2020001_aid0001.png");
    }

    #[test]
    fn test_write_atomic_leaves_only_the_png() {
        let dir = tempfile::tempdir().unwrap();
        let f = frame("a_doy2020001.tif");

        let path = f.write_atomic(dir.path()).unwrap();
        // Second write replaces the first
        f.write_atomic(dir.path()).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(*decoded.get_pixel(2, 1), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = frame("a.tif").write_atomic(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, RenderTaskError::Write { .. }));
    }
}

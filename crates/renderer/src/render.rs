//! Per-file frame rendering: read, clip, scale, classify, label.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use boundary::BoundaryRegion;
use quality::{QualityCodeSet, QualityPairing};
use raster_common::{AcquisitionDate, RenderTaskError};
use raster_io::{read_geotiff, NodataSource, RasterClipper, ScaleSource, ValueScaler};

use crate::classify::classify;
use crate::frame::RenderedFrame;
use crate::label::LabelPainter;
use crate::style::ColorBreakpointTable;

/// Optional quality gate: cells whose code is not acceptable render as
/// unknown.
#[derive(Debug, Clone)]
pub struct QualityMask {
    pub pairing: QualityPairing,
    pub codes: Arc<QualityCodeSet>,
}

/// Renders one frame per source raster. Shared immutably by every worker.
pub struct FrameRenderer {
    region: BoundaryRegion,
    table: ColorBreakpointTable,
    label: LabelPainter,
    quality: Option<QualityMask>,
    nodata: NodataSource,
    scale: ScaleSource,
    clipper: RasterClipper,
}

impl FrameRenderer {
    pub fn new(region: BoundaryRegion, table: ColorBreakpointTable, label: LabelPainter) -> Self {
        Self {
            region,
            table,
            label,
            quality: None,
            nodata: NodataSource::default(),
            scale: ScaleSource::default(),
            clipper: RasterClipper::new(),
        }
    }

    pub fn with_quality(mut self, quality: QualityMask) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_scaling(mut self, nodata: NodataSource, scale: ScaleSource) -> Self {
        self.nodata = nodata;
        self.scale = scale;
        self
    }

    pub fn region(&self) -> &BoundaryRegion {
        &self.region
    }

    pub fn table(&self) -> &ColorBreakpointTable {
        &self.table
    }

    /// Render a source raster into an in-memory frame.
    pub fn render(&self, source: &Path) -> Result<RenderedFrame, RenderTaskError> {
        let date = AcquisitionDate::from_filename(source)?;
        let grid = read_geotiff(source)?;
        let clipped = self.clipper.clip(&grid, &self.region)?;

        let scaler = ValueScaler::for_grid(&grid, self.nodata, self.scale);
        let scaled = scaler.scale_clipped(&clipped);

        let accepted = match &self.quality {
            Some(mask) => Some(self.accepted_cells(source, &grid, mask)?),
            None => None,
        };

        let mut image = classify(&scaled, &self.table, accepted.as_deref())?;
        let label = date.frame_label();
        self.label.draw(&mut image, &label);

        debug!(
            file = %source.display(),
            width = image.width(),
            height = image.height(),
            inside = clipped.inside_count(),
            "Rendered frame"
        );

        Ok(RenderedFrame {
            image,
            date,
            label,
            source: source.to_path_buf(),
        })
    }

    /// Render a source raster and write it atomically into `out_dir`.
    pub fn render_to(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, RenderTaskError> {
        self.render(source)?.write_atomic(out_dir)
    }

    fn accepted_cells(
        &self,
        source: &Path,
        values: &raster_common::RasterGrid,
        mask: &QualityMask,
    ) -> Result<Vec<bool>, RenderTaskError> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let quality_path = mask
            .pairing
            .quality_name(&name)
            .map(|q| source.with_file_name(q))
            .ok_or_else(|| {
                RenderTaskError::MissingQualityLayer(format!(
                    "{} does not contain '{}'",
                    name, mask.pairing.from
                ))
            })?;
        if !quality_path.is_file() {
            return Err(RenderTaskError::MissingQualityLayer(
                quality_path.display().to_string(),
            ));
        }

        let quality = read_geotiff(&quality_path)?;
        self.clipper.check_co_registered(values, &quality)?;
        let clipped = self.clipper.clip(&quality, &self.region)?;

        Ok(clipped
            .grid
            .data
            .iter()
            .map(|code| mask.codes.contains_value(*code))
            .collect())
    }
}

//! Raster input for the feature pipelines.
//!
//! - [`geotiff`]: single-band GeoTIFF decoding with georeferencing, nodata
//!   and GDAL scale metadata
//! - [`clip`]: crop a grid to a region's extent and mask cells outside it
//! - [`scale`]: nodata to NaN and scale-factor application

pub mod clip;
pub mod geotiff;
pub mod scale;

pub use clip::{ClippedGrid, RasterClipper, Window};
pub use geotiff::{read_geotiff, read_geotiff_from_reader};
pub use scale::{NodataSource, ScaleSource, ValueScaler};

//! Common types shared by the wildfire raster feature crates.

pub mod bbox;
pub mod env;
pub mod error;
pub mod grid;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{
    BoundaryLoadError, ConfigError, FilenameParseError, PipelineError, QualityTableError,
    RasterClipError, ReferenceLoadError, RenderTaskError,
};
pub use env::expand_env_vars;
pub use grid::{is_missing, Crs, GeoTransform, RasterGrid, MISSING};
pub use time::AcquisitionDate;

//! Error taxonomy for the raster feature pipelines.
//!
//! Reference-load errors are fatal for a run. Clip, filename and render
//! errors are per-item: callers log them, record a skip and move on.

use std::io;
use thiserror::Error;

/// Failure to load the boundary polygon set.
#[derive(Debug, Error)]
pub enum BoundaryLoadError {
    #[error("failed to read boundary source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid GeoJSON in {path}: {message}")]
    InvalidGeoJson { path: String, message: String },

    #[error("feature {index} is missing property '{property}'")]
    MissingProperty { index: usize, property: String },

    #[error("feature {index} has unsupported geometry '{kind}'")]
    UnsupportedGeometry { index: usize, kind: String },

    #[error("boundary source {0} contains no features")]
    Empty(String),
}

/// Failure to derive the acceptable quality-code set.
#[derive(Debug, Error)]
pub enum QualityTableError {
    #[error("failed to read quality table {path}: {message}")]
    Read { path: String, message: String },

    #[error("quality table is missing required column '{0}'")]
    MissingColumn(String),

    #[error("quality table row {row}: code '{value}' is not an integer")]
    InvalidCode { row: usize, value: String },
}

/// Prerequisite inputs that abort a run when missing or malformed.
#[derive(Debug, Error)]
pub enum ReferenceLoadError {
    #[error(transparent)]
    Boundary(#[from] BoundaryLoadError),

    #[error(transparent)]
    QualityTable(#[from] QualityTableError),
}

/// Failure to read or clip one raster for one region.
#[derive(Debug, Error)]
pub enum RasterClipError {
    #[error("failed to open raster {path}: {message}")]
    Open { path: String, message: String },

    #[error("failed to decode raster {path}: {message}")]
    Decode { path: String, message: String },

    #[error("region '{region}' does not overlap the raster extent")]
    NoOverlap { region: String },

    #[error("CRS mismatch: raster is {raster}, boundary is {boundary}")]
    CrsMismatch { raster: String, boundary: String },

    #[error("grids are not co-registered: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}

impl RasterClipError {
    /// Create an Open error.
    pub fn open(path: impl Into<String>, msg: impl ToString) -> Self {
        Self::Open {
            path: path.into(),
            message: msg.to_string(),
        }
    }

    /// Create a Decode error.
    pub fn decode(path: impl Into<String>, msg: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: msg.to_string(),
        }
    }
}

/// The acquisition date could not be derived from a file name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilenameParseError {
    #[error("no 'doyYYYYDDD' token in file name '{0}'")]
    MissingToken(String),

    #[error("invalid acquisition date '{token}' in file name '{name}'")]
    InvalidDate { name: String, token: String },
}

/// Failure while producing one classified frame.
#[derive(Debug, Error)]
pub enum RenderTaskError {
    #[error(transparent)]
    Clip(#[from] RasterClipError),

    #[error(transparent)]
    Filename(#[from] FilenameParseError),

    #[error("quality layer not found: {0}")]
    MissingQualityLayer(String),

    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error("failed to write frame {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Run-level failure of the aggregation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    ReferenceLoad(#[from] ReferenceLoadError),

    #[error("failed to list input directory {path}: {message}")]
    InputListing { path: String, message: String },

    #[error("failed to write output {path}: {message}")]
    Output { path: String, message: String },
}

/// Invalid product or style configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("style not found: {0}")]
    StyleNotFound(String),

    #[error("invalid color '{0}', expected #RRGGBB")]
    InvalidColor(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Classification rendering of product rasters.
//!
//! Each source raster is clipped to one merged boundary region, scaled,
//! colored through a [`ColorBreakpointTable`], labeled with its acquisition
//! date and written as `<stem>.png`. A [`RenderPool`] runs one task per
//! file on a bounded rayon pool.

pub mod classify;
pub mod config;
pub mod frame;
pub mod label;
pub mod pool;
pub mod render;
pub mod style;

pub use classify::classify;
pub use config::{RenderConfig, RenderQuality, StyleRef};
pub use frame::RenderedFrame;
pub use label::{LabelPainter, LabelStyle};
pub use pool::{discover_sources, FailedFrame, RenderPool, RenderSummary};
pub use render::{FrameRenderer, QualityMask};
pub use style::{hex_to_rgb, BreakpointEntry, ColorBreakpointTable, StyleConfig, StyleDefinition};

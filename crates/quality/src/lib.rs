//! Quality filtering for satellite products.
//!
//! Each product ships a lookup table describing what every quality code
//! means. A [`QualityFilterEngine`] applies declarative [`QualityRule`]s to
//! that table and yields the [`QualityCodeSet`] of acceptable codes.

pub mod config;
pub mod engine;
pub mod presets;
pub mod rules;

pub use config::{QualityConfig, QualityPairing, QualityPreset};
pub use engine::{QualityCodeSet, QualityFilterEngine};
pub use rules::{parse_bool, QualityRule};

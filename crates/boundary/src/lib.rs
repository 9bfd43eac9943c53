//! Administrative boundary catalog.
//!
//! Loads a GeoJSON FeatureCollection of polygon features into ordered
//! [`BoundaryRegion`] records that the clipping stage borrows.

pub mod catalog;
pub mod geojson;

pub use catalog::{BoundaryCatalog, BoundaryFields, BoundaryRegion, RegionId};

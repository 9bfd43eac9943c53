//! Ordered set of administrative regions loaded from a GeoJSON file.

use geo::{BoundingRect, Contains, MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use raster_common::{BoundaryLoadError, BoundingBox, Crs};

use crate::geojson::{FeatureCollection, GeometryError};

/// Administrative code of a region (e.g. a county FIPS code).
///
/// Ids that are both integers compare numerically, so "9" sorts before
/// "10". Integer ids sort before non-integer ids, which compare as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }
}

impl Ord for RegionId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for RegionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One administrative region.
#[derive(Debug, Clone)]
pub struct BoundaryRegion {
    pub id: RegionId,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    /// CRS of the source file, when it declares one
    pub crs: Option<Crs>,
}

impl BoundaryRegion {
    /// Bounding extent of the geometry, `None` for an empty geometry.
    pub fn bbox(&self) -> Option<BoundingBox> {
        self.geometry
            .bounding_rect()
            .map(|r| BoundingBox::new(r.min().x, r.min().y, r.max().x, r.max().y))
    }

    /// Whether the point lies strictly inside the geometry.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.geometry.contains(&Point::new(x, y))
    }
}

/// Property names carrying the region id and display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFields {
    #[serde(default = "default_id_property")]
    pub id_property: String,
    #[serde(default = "default_name_property")]
    pub name_property: String,
}

fn default_id_property() -> String {
    "COUNTY_FIPS".to_string()
}

fn default_name_property() -> String {
    "COUNTY_NAME".to_string()
}

impl Default for BoundaryFields {
    fn default() -> Self {
        Self {
            id_property: default_id_property(),
            name_property: default_name_property(),
        }
    }
}

/// Regions in source file order.
#[derive(Debug, Clone)]
pub struct BoundaryCatalog {
    regions: Vec<BoundaryRegion>,
    crs: Option<Crs>,
}

impl BoundaryCatalog {
    /// Load a GeoJSON FeatureCollection from disk.
    pub fn load(path: impl AsRef<Path>, fields: &BoundaryFields) -> Result<Self, BoundaryLoadError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let json = std::fs::read_to_string(path).map_err(|e| BoundaryLoadError::Io {
            path: source.clone(),
            source: e,
        })?;

        let catalog = Self::from_geojson_str(&json, &source, fields)?;
        info!(
            path = %source,
            regions = catalog.len(),
            crs = ?catalog.crs,
            "Loaded boundary catalog"
        );
        Ok(catalog)
    }

    /// Parse a GeoJSON FeatureCollection. `source` names it in errors.
    pub fn from_geojson_str(
        json: &str,
        source: &str,
        fields: &BoundaryFields,
    ) -> Result<Self, BoundaryLoadError> {
        let collection: FeatureCollection =
            serde_json::from_str(json).map_err(|e| BoundaryLoadError::InvalidGeoJson {
                path: source.to_string(),
                message: e.to_string(),
            })?;

        if collection.type_ != "FeatureCollection" {
            return Err(BoundaryLoadError::InvalidGeoJson {
                path: source.to_string(),
                message: format!("expected FeatureCollection, found {}", collection.type_),
            });
        }
        if collection.features.is_empty() {
            return Err(BoundaryLoadError::Empty(source.to_string()));
        }

        let crs = collection.declared_crs();
        let mut regions = Vec::with_capacity(collection.features.len());

        for (index, feature) in collection.features.iter().enumerate() {
            let missing = |property: &str| BoundaryLoadError::MissingProperty {
                index,
                property: property.to_string(),
            };
            let id = feature
                .property_string(&fields.id_property)
                .ok_or_else(|| missing(&fields.id_property))?;
            let name = feature
                .property_string(&fields.name_property)
                .ok_or_else(|| missing(&fields.name_property))?;

            let raw = feature
                .geometry
                .as_ref()
                .ok_or_else(|| BoundaryLoadError::UnsupportedGeometry {
                    index,
                    kind: "null".to_string(),
                })?;
            let geometry = raw.to_multi_polygon().map_err(|e| match e {
                GeometryError::Unsupported(kind) => {
                    BoundaryLoadError::UnsupportedGeometry { index, kind }
                }
                GeometryError::Malformed(message) => BoundaryLoadError::InvalidGeoJson {
                    path: source.to_string(),
                    message: format!("feature {}: {}", index, message),
                },
            })?;

            debug!(index, id = %id, name = %name, polygons = geometry.0.len(), "Parsed region");

            regions.push(BoundaryRegion {
                id: RegionId::new(id),
                name,
                geometry,
                crs,
            });
        }

        Ok(Self { regions, crs })
    }

    pub fn regions(&self) -> &[BoundaryRegion] {
        &self.regions
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundaryRegion> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn crs(&self) -> Option<Crs> {
        self.crs
    }

    pub fn get(&self, id: &RegionId) -> Option<&BoundaryRegion> {
        self.regions.iter().find(|r| &r.id == id)
    }

    /// A single region covering every feature of the catalog.
    pub fn merged(&self, id: impl Into<String>, name: impl Into<String>) -> BoundaryRegion {
        let polygons = self
            .regions
            .iter()
            .flat_map(|r| r.geometry.0.iter().cloned())
            .collect();

        BoundaryRegion {
            id: RegionId::new(id),
            name: name.into(),
            geometry: MultiPolygon::new(polygons),
            crs: self.crs,
        }
    }
}

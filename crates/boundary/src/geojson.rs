//! Minimal GeoJSON model for polygon boundary files.
//!
//! Only what a boundary catalog needs: a FeatureCollection of features with
//! Polygon or MultiPolygon geometry and a flat property map.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};

use raster_common::Crs;

/// A GeoJSON FeatureCollection.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default)]
    pub features: Vec<Feature>,

    /// Legacy (2008) named CRS member, still written by many GIS exports.
    #[serde(default)]
    pub crs: Option<NamedCrs>,
}

impl FeatureCollection {
    /// CRS declared by the legacy `crs` member, if any.
    pub fn declared_crs(&self) -> Option<Crs> {
        self.crs
            .as_ref()
            .and_then(|c| c.properties.get("name"))
            .and_then(|v| v.as_str())
            .and_then(Crs::parse)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedCrs {
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// A GeoJSON Feature.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<RawGeometry>,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    /// Property rendered as a string. Integers keep no decimal point.
    pub fn property_string(&self, key: &str) -> Option<String> {
        match self.properties.as_ref()?.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(
                n.as_i64()
                    .map(|i| i.to_string())
                    .unwrap_or_else(|| n.to_string()),
            ),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Geometry with its coordinates left untyped until the kind is known.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGeometry {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub coordinates: Value,
}

/// Why a geometry could not be converted.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    Unsupported(String),
    Malformed(String),
}

type Ring = Vec<Vec<f64>>;

impl RawGeometry {
    /// Convert Polygon / MultiPolygon coordinates into a multi-polygon.
    pub fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>, GeometryError> {
        match self.kind.as_str() {
            "Polygon" => {
                let rings: Vec<Ring> = serde_json::from_value(self.coordinates.clone())
                    .map_err(|e| GeometryError::Malformed(e.to_string()))?;
                Ok(MultiPolygon::new(vec![polygon_from_rings(&rings)?]))
            }
            "MultiPolygon" => {
                let polygons: Vec<Vec<Ring>> = serde_json::from_value(self.coordinates.clone())
                    .map_err(|e| GeometryError::Malformed(e.to_string()))?;
                let polygons = polygons
                    .iter()
                    .map(|rings| polygon_from_rings(rings))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(MultiPolygon::new(polygons))
            }
            other => Err(GeometryError::Unsupported(other.to_string())),
        }
    }
}

fn polygon_from_rings(rings: &[Ring]) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.iter().map(|ring| line_string(ring));
    let exterior = rings
        .next()
        .ok_or_else(|| GeometryError::Malformed("polygon without exterior ring".to_string()))??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn line_string(ring: &Ring) -> Result<LineString<f64>, GeometryError> {
    if ring.len() < 3 {
        return Err(GeometryError::Malformed(format!(
            "ring has {} positions, need at least 3",
            ring.len()
        )));
    }
    ring.iter()
        .map(|pos| match pos.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(GeometryError::Malformed("position with fewer than 2 values".to_string())),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

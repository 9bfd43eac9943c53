//! Loading boundary catalogs from disk.

use boundary::{BoundaryCatalog, BoundaryFields, RegionId};
use raster_common::{BoundaryLoadError, Crs};
use test_utils::{write_boundary, write_text, RegionFixture};

fn counties() -> Vec<RegionFixture> {
    vec![
        RegionFixture::new("6075", "San Francisco", (0.0, 0.0, 1.0, 1.0)),
        RegionFixture::new("6001", "Alameda", (1.0, 0.0, 2.0, 1.0)),
        RegionFixture::new("6013", "Contra Costa", (1.0, 1.0, 2.0, 2.0)),
    ]
}

#[test]
fn test_load_preserves_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_boundary(dir.path(), "counties.geojson", &counties()).unwrap();

    let catalog = BoundaryCatalog::load(&path, &BoundaryFields::default()).unwrap();

    let ids: Vec<&str> = catalog.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["6075", "6001", "6013"]);
    assert_eq!(catalog.regions()[1].name, "Alameda");
    assert_eq!(catalog.crs(), Some(Crs::WGS84));
    assert!(catalog.get(&RegionId::new("6013")).is_some());
}

#[test]
fn test_merged_covers_all_regions() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_boundary(dir.path(), "counties.geojson", &counties()).unwrap();
    let catalog = BoundaryCatalog::load(&path, &BoundaryFields::default()).unwrap();

    let state = catalog.merged("06", "California");
    assert_eq!(state.geometry.0.len(), 3);
    assert!(state.contains(0.5, 0.5));
    assert!(state.contains(1.5, 1.5));
    assert!(!state.contains(0.5, 1.5));
    assert_eq!(state.crs, Some(Crs::WGS84));
}

#[test]
fn test_custom_property_names() {
    let json = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"GEOID": 6037, "NAME": "Los Angeles"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[0,0],[1,0],[1,1],[0,0]]]]}}
    ]}"#;
    let fields = BoundaryFields {
        id_property: "GEOID".to_string(),
        name_property: "NAME".to_string(),
    };
    let catalog = BoundaryCatalog::from_geojson_str(json, "inline", &fields).unwrap();
    assert_eq!(catalog.regions()[0].id, RegionId::new("6037"));
    assert_eq!(catalog.crs(), None);
}

#[test]
fn test_missing_file() {
    let err = BoundaryCatalog::load("/nonexistent/counties.geojson", &BoundaryFields::default())
        .unwrap_err();
    assert!(matches!(err, BoundaryLoadError::Io { .. }));
}

#[test]
fn test_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_text(dir.path(), "bad.geojson", "{ not json").unwrap();
    let err = BoundaryCatalog::load(&path, &BoundaryFields::default()).unwrap_err();
    assert!(matches!(err, BoundaryLoadError::InvalidGeoJson { .. }));
}

#[test]
fn test_empty_collection() {
    let err = BoundaryCatalog::from_geojson_str(
        r#"{"type": "FeatureCollection", "features": []}"#,
        "empty.geojson",
        &BoundaryFields::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BoundaryLoadError::Empty(source) if source == "empty.geojson"));
}

#[test]
fn test_missing_name_property() {
    let json = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"COUNTY_FIPS": "1"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
    ]}"#;
    let err = BoundaryCatalog::from_geojson_str(json, "inline", &BoundaryFields::default()).unwrap_err();
    assert!(matches!(
        err,
        BoundaryLoadError::MissingProperty { index: 0, property } if property == "COUNTY_NAME"
    ));
}

#[test]
fn test_point_and_null_geometry_rejected() {
    let point = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"COUNTY_FIPS": "1", "COUNTY_NAME": "A"},
         "geometry": {"type": "Point", "coordinates": [0, 0]}}
    ]}"#;
    let err = BoundaryCatalog::from_geojson_str(point, "inline", &BoundaryFields::default()).unwrap_err();
    assert!(matches!(err, BoundaryLoadError::UnsupportedGeometry { kind, .. } if kind == "Point"));

    let null = point.replace(r#"{"type": "Point", "coordinates": [0, 0]}"#, "null");
    let err = BoundaryCatalog::from_geojson_str(&null, "inline", &BoundaryFields::default()).unwrap_err();
    assert!(matches!(err, BoundaryLoadError::UnsupportedGeometry { kind, .. } if kind == "null"));
}

//! Reading GeoTIFFs written by the test generator, then clipping and
//! scaling them.

use boundary::{BoundaryCatalog, BoundaryFields};
use raster_common::{Crs, RasterClipError};
use raster_io::{read_geotiff, NodataSource, RasterClipper, ScaleSource, ValueScaler};
use test_utils::{
    assert_approx_eq, assert_coords_approx_eq, boundary_geojson, create_code_grid,
    create_index_grid, require_test_file, write_geotiff_f32, write_geotiff_u16, GeoTiffSpec,
    RegionFixture,
};

#[test]
fn test_reader_recovers_georeferencing_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("MOD13A1.061__500m_16_days_NDVI_doy2020001_aid0001.tif");
    let spec = GeoTiffSpec::new(6, 4)
        .with_origin(-124.0, 42.0)
        .with_pixel_size(0.5)
        .with_nodata(-3000.0)
        .with_scale_factor(0.0001);
    write_geotiff_f32(&path, &spec, &create_index_grid(6, 4)).unwrap();

    let grid = read_geotiff(&path).unwrap();

    assert_eq!(grid.shape(), (4, 6));
    assert_eq!(grid.nodata, Some(-3000.0));
    assert_eq!(grid.scale_factor, Some(0.0001));
    assert_eq!(grid.crs, Some(Crs::WGS84));
    assert_coords_approx_eq!(
        (grid.transform.origin_x, grid.transform.origin_y),
        (-124.0, 42.0),
        1e-12
    );
    assert_approx_eq!(grid.transform.pixel_width, 0.5, 1e-12);
    assert_approx_eq!(grid.transform.pixel_height, -0.5, 1e-12);
    assert_eq!(grid.get(1, 2), Some(8.0));
}

#[test]
fn test_reader_projected_crs_and_integer_samples() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qa.tif");
    let spec = GeoTiffSpec::new(2, 2).with_epsg(Some(32611));
    write_geotiff_u16(&path, &spec, &create_code_grid(2, 2, &[2112, 35904])).unwrap();

    let grid = read_geotiff(&path).unwrap();
    assert_eq!(grid.crs, Some(Crs(32611)));
    assert_eq!(grid.data, vec![2112.0, 35904.0, 2112.0, 35904.0]);
    assert_eq!(grid.nodata, None);
    assert_eq!(grid.scale_factor, None);
}

#[test]
fn test_reader_missing_file() {
    let err = read_geotiff("/nonexistent/layer.tif").unwrap_err();
    assert!(matches!(err, RasterClipError::Open { .. }));
}

#[test]
fn test_reader_not_a_tiff() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.tif");
    std::fs::write(&path, b"definitely not a tiff").unwrap();
    assert!(read_geotiff(&path).is_err());
}

#[test]
fn test_clip_and_scale_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layer.tif");
    // 4x4 unit cells, lower-left at (0, 0)
    let spec = GeoTiffSpec::new(4, 4).with_nodata(-1.0).with_scale_factor(0.5);
    let mut data = create_index_grid(4, 4);
    data[5] = -1.0;
    write_geotiff_f32(&path, &spec, &data).unwrap();

    let catalog = BoundaryCatalog::from_geojson_str(
        &boundary_geojson(&[RegionFixture::new("6001", "Alameda", (1.0, 1.0, 3.0, 3.0))]),
        "inline",
        &BoundaryFields::default(),
    )
    .unwrap();

    let grid = read_geotiff(&path).unwrap();
    let clipped = RasterClipper::new().clip(&grid, &catalog.regions()[0]).unwrap();
    let scaled = ValueScaler::for_grid(&grid, NodataSource::Metadata, ScaleSource::default())
        .scale_clipped(&clipped);

    assert_eq!(scaled.shape(), (2, 2));
    assert!(scaled.grid.data[0].is_nan());
    assert_eq!(&scaled.grid.data[1..], &[3.0, 4.5, 5.0]);
    assert_eq!(scaled.inside_count(), 4);
}

#[test]
fn test_scale_sources_from_yaml() {
    let scale: ScaleSource = serde_yaml::from_str("{ source: fixed, value: 0.0001 }").unwrap();
    assert_eq!(scale, ScaleSource::Fixed { value: 0.0001 });

    let scale: ScaleSource = serde_yaml::from_str("source: metadata").unwrap();
    assert_eq!(scale, ScaleSource::Metadata { default: 1.0 });

    let nodata: NodataSource = serde_yaml::from_str("source: none").unwrap();
    assert_eq!(nodata, NodataSource::None);
}

#[test]
fn test_real_vegetation_index_tile() {
    let path = require_test_file!("MOD13A1.061__500m_16_days_NDVI_doy2020001_aid0001.tif");
    let grid = read_geotiff(&path).unwrap();

    assert!(!grid.is_empty());
    assert_eq!(grid.nodata, Some(-3000.0));
}

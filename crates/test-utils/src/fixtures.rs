//! Common test fixtures: boundary files, quality lookup tables and product
//! file names.

use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A rectangular region feature for a boundary FeatureCollection.
#[derive(Debug, Clone)]
pub struct RegionFixture {
    pub id: String,
    pub name: String,
    /// (min_x, min_y, max_x, max_y)
    pub rect: (f64, f64, f64, f64),
}

impl RegionFixture {
    pub fn new(id: &str, name: &str, rect: (f64, f64, f64, f64)) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            rect,
        }
    }

    fn to_feature(&self) -> Value {
        let (x0, y0, x1, y1) = self.rect;
        json!({
            "type": "Feature",
            "properties": { "COUNTY_FIPS": self.id, "COUNTY_NAME": self.name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
            }
        })
    }
}

/// Build a FeatureCollection of rectangular regions.
pub fn boundary_geojson(regions: &[RegionFixture]) -> String {
    json!({
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::4326" } },
        "features": regions.iter().map(RegionFixture::to_feature).collect::<Vec<_>>()
    })
    .to_string()
}

/// Write a boundary FeatureCollection to `dir/name`.
pub fn write_boundary(dir: &Path, name: &str, regions: &[RegionFixture]) -> io::Result<PathBuf> {
    write_text(dir, name, &boundary_geojson(regions))
}

/// Write any text fixture to `dir/name`.
pub fn write_text(dir: &Path, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

/// Vegetation-index (MOD13A1 VI Quality) lookup table excerpt.
///
/// Codes 2112 and 2116 pass the vegetation-index rules; 2057 fails on
/// MODLAND, 3140 on aerosol quantity and 35904 on adjacent clouds.
pub const VI_QUALITY_TABLE: &str = "\
Value,MODLAND,VI Usefulness,Aerosol Quantity,Adjacent cloud detected,Atmosphere BRDF Correction,Mixed Clouds,Land/Water Mask,Possible snow/ice,Possible shadow
2112,VI produced with good quality,Highest quality,Low,No,No,No,Land (Nothing else but land),No,No
2116,\"VI produced, but check other QA\",Lower quality,Average,No,No,No,Land (Nothing else but land),No,No
2057,Pixel produced but most probably cloudy,Lowest quality,Low,No,No,No,Land (Nothing else but land),No,No
3140,VI produced with good quality,Highest quality,High,No,No,No,Land (Nothing else but land),No,No
35904,VI produced with good quality,Highest quality,Low,Yes,No,No,Land (Nothing else but land),No,No
";

/// Burn-area (MCD64A1 QA) lookup table excerpt.
///
/// Only code 1 passes the burn-area rules.
pub const BA_QUALITY_TABLE: &str = "\
Value,Valid data,Shortened mapping period,Grid cell relabeled algorithm,Special circumstances unburned
1,True,False,True,None
3,True,True,True,None
5,True,False,False,None
0,False,False,False,None
33,True,False,True,Valid observations spaced too sparsely in time
";

/// Burn-area table where no row passes.
pub const BA_QUALITY_TABLE_ALL_FAIL: &str = "\
Value,Valid data,Shortened mapping period,Grid cell relabeled algorithm,Special circumstances unburned
0,False,False,False,None
2,False,True,False,None
";

/// MOD13A1 value layer file name for a year and day of year.
pub fn ndvi_file_name(year: i32, doy: u32) -> String {
    format!("MOD13A1.061__500m_16_days_NDVI_doy{}{:03}_aid0001.tif", year, doy)
}

/// MOD13A1 quality layer file name paired with [`ndvi_file_name`].
pub fn vi_quality_file_name(year: i32, doy: u32) -> String {
    format!("MOD13A1.061__500m_16_days_VI_Quality_doy{}{:03}_aid0001.tif", year, doy)
}

/// MCD64A1 value layer file name.
pub fn burn_date_file_name(year: i32, doy: u32) -> String {
    format!("MCD64A1.061_Burn_Date_doy{}{:03}_aid0001.tif", year, doy)
}

/// MCD64A1 quality layer file name paired with [`burn_date_file_name`].
pub fn burn_qa_file_name(year: i32, doy: u32) -> String {
    format!("MCD64A1.061_QA_doy{}{:03}_aid0001.tif", year, doy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_geojson_shape() {
        let json = boundary_geojson(&[RegionFixture::new("001", "Alpha", (0.0, 0.0, 2.0, 2.0))]);
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["features"][0]["properties"]["COUNTY_FIPS"], "001");
        assert_eq!(
            value["features"][0]["geometry"]["coordinates"][0]
                .as_array()
                .unwrap()
                .len(),
            5
        );
    }

    #[test]
    fn test_paired_file_names() {
        assert_eq!(
            ndvi_file_name(2020, 1).replace("NDVI", "VI_Quality"),
            vi_quality_file_name(2020, 1)
        );
        assert_eq!(
            burn_date_file_name(2021, 32).replace("Burn_Date", "QA"),
            burn_qa_file_name(2021, 32)
        );
    }
}

//! Single-band GeoTIFF reader.
//!
//! Georeferencing comes from ModelPixelScale + ModelTiepoint or, failing
//! that, ModelTransformation. The CRS is the EPSG code in the
//! GeoKeyDirectory. Nodata is GDAL_NODATA and the scale factor is the
//! `scale_factor` item of GDAL_METADATA.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{debug, warn};

use raster_common::{Crs, GeoTransform, RasterClipError, RasterGrid};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_METADATA: u16 = 42112;
const GDAL_NODATA: u16 = 42113;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;
const USER_DEFINED: u16 = 32767;

/// Read band 1 of a GeoTIFF file.
pub fn read_geotiff(path: impl AsRef<Path>) -> Result<RasterGrid, RasterClipError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let file = File::open(path).map_err(|e| RasterClipError::open(&source, e))?;
    read_geotiff_from_reader(BufReader::new(file), &source)
}

/// Read band 1 of a GeoTIFF from any seekable reader.
pub fn read_geotiff_from_reader<R: Read + Seek>(
    reader: R,
    source: &str,
) -> Result<RasterGrid, RasterClipError> {
    let mut decoder = Decoder::new(reader).map_err(|e| RasterClipError::open(source, e))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| RasterClipError::decode(source, e))?;
    let (width, height) = (width as usize, height as usize);

    let transform = read_transform(&mut decoder).unwrap_or_else(|| {
        warn!(source, "No georeferencing tags, using identity transform");
        GeoTransform::default()
    });
    let crs = decoder
        .get_tag_u16_vec(tag(GEO_KEY_DIRECTORY))
        .ok()
        .and_then(|keys| epsg_from_geo_keys(&keys))
        .map(Crs);
    let metadata = decoder
        .get_tag_ascii_string(tag(GDAL_METADATA))
        .ok()
        .map(|xml| GdalMetadata::parse(&xml))
        .unwrap_or_default();
    let nodata = decoder
        .get_tag_ascii_string(tag(GDAL_NODATA))
        .ok()
        .and_then(|s| parse_nodata(&s))
        .or_else(|| metadata.fill_value());
    let scale_factor = metadata.scale_factor();

    let image = decoder
        .read_image()
        .map_err(|e| RasterClipError::decode(source, e))?;
    let samples = decoding_result_to_f64(image)
        .ok_or_else(|| RasterClipError::decode(source, "unsupported sample format"))?;

    let cells = width * height;
    if cells == 0 || samples.len() % cells != 0 {
        return Err(RasterClipError::decode(
            source,
            format!("{} samples for a {}x{} image", samples.len(), width, height),
        ));
    }

    // Chunky multi-sample images interleave bands; keep band 1
    let per_pixel = samples.len() / cells;
    let data = if per_pixel == 1 {
        samples
    } else {
        samples.into_iter().step_by(per_pixel).collect()
    };

    debug!(
        source,
        width,
        height,
        ?nodata,
        ?scale_factor,
        crs = ?crs,
        "Decoded GeoTIFF band"
    );

    let grid = RasterGrid::new(width, height, data, transform)
        .ok_or_else(|| RasterClipError::decode(source, "band size does not match dimensions"))?;
    Ok(grid
        .with_nodata(nodata)
        .with_crs(crs)
        .with_scale_factor(scale_factor))
}

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE)).ok();
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT)).ok();

    if let (Some(scale), Some(tiepoint)) = (&scale, &tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z]; scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
        }
    }

    // Row-major 4x4 matrix
    let matrix = decoder.get_tag_f64_vec(tag(MODEL_TRANSFORMATION)).ok()?;
    if matrix.len() < 16 {
        return None;
    }
    Some(GeoTransform {
        origin_x: matrix[3],
        origin_y: matrix[7],
        pixel_width: matrix[0],
        pixel_height: matrix[5],
        row_rotation: matrix[1],
        col_rotation: matrix[4],
    })
}

/// EPSG code from a GeoKeyDirectory, preferring the projected CRS key.
pub fn epsg_from_geo_keys(keys: &[u16]) -> Option<u32> {
    if keys.len() < 4 {
        return None;
    }
    let count = keys[3] as usize;

    let lookup = |wanted: u16| {
        keys[4..]
            .chunks_exact(4)
            .take(count)
            // location 0 means the value is stored inline
            .find(|entry| entry[0] == wanted && entry[1] == 0)
            .map(|entry| entry[3])
            .filter(|code| *code != 0 && *code != USER_DEFINED)
            .map(u32::from)
    };

    lookup(PROJECTED_CS_TYPE_KEY).or_else(|| lookup(GEOGRAPHIC_TYPE_KEY))
}

fn parse_nodata(text: &str) -> Option<f64> {
    let text = text.trim_end_matches('\0').trim();
    match text.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        _ => text.parse().ok(),
    }
}

fn decoding_result_to_f64(result: DecodingResult) -> Option<Vec<f64>> {
    let data = match result {
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        #[allow(unreachable_patterns)]
        _ => return None,
    };
    Some(data)
}

/// `<GDALMetadata><Item name="...">value</Item>...</GDALMetadata>`
#[derive(Debug, Default, Deserialize)]
struct GdalMetadata {
    #[serde(rename = "Item", default)]
    items: Vec<GdalItem>,
}

#[derive(Debug, Deserialize)]
struct GdalItem {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@role", default)]
    role: Option<String>,
    #[serde(rename = "$text", default)]
    value: String,
}

impl GdalMetadata {
    fn parse(xml: &str) -> Self {
        let xml = xml.trim_end_matches('\0');
        quick_xml::de::from_str(xml).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring unparseable GDAL_METADATA");
            Self::default()
        })
    }

    fn item(&self, matches: impl Fn(&GdalItem) -> bool) -> Option<f64> {
        self.items
            .iter()
            .find(|item| matches(item))
            .and_then(|item| item.value.trim().parse().ok())
    }

    fn scale_factor(&self) -> Option<f64> {
        self.item(|i| i.name.eq_ignore_ascii_case("scale_factor"))
            .or_else(|| self.item(|i| i.role.as_deref() == Some("scale")))
    }

    fn fill_value(&self) -> Option<f64> {
        self.item(|i| i.name == "_FillValue")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epsg_from_geo_keys() {
        let geographic = [1, 1, 0, 3, 1024, 0, 1, 2, 1025, 0, 1, 1, 2048, 0, 1, 4326];
        assert_eq!(epsg_from_geo_keys(&geographic), Some(4326));

        let projected = [1, 1, 0, 2, 2048, 0, 1, 4269, 3072, 0, 1, 3310];
        assert_eq!(epsg_from_geo_keys(&projected), Some(3310));

        let user_defined = [1, 1, 0, 1, 3072, 0, 1, 32767];
        assert_eq!(epsg_from_geo_keys(&user_defined), None);
        assert_eq!(epsg_from_geo_keys(&[1, 1]), None);
    }

    #[test]
    fn test_gdal_metadata_scale_factor() {
        let xml = r#"<GDALMetadata>
  <Item name="long_name">500m 16 days NDVI</Item>
  <Item name="scale_factor">0.0001</Item>
  <Item name="_FillValue">-3000</Item>
</GDALMetadata>"#;
        let metadata = GdalMetadata::parse(xml);
        assert_eq!(metadata.scale_factor(), Some(0.0001));
        assert_eq!(metadata.fill_value(), Some(-3000.0));
    }

    #[test]
    fn test_gdal_metadata_role_scale() {
        let xml = r#"<GDALMetadata><Item name="SCALE" sample="0" role="scale">0.5</Item></GDALMetadata>"#;
        assert_eq!(GdalMetadata::parse(xml).scale_factor(), Some(0.5));
    }

    #[test]
    fn test_gdal_metadata_garbage() {
        assert_eq!(GdalMetadata::parse("<not closed").scale_factor(), None);
    }

    #[test]
    fn test_parse_nodata() {
        assert_eq!(parse_nodata("-3000\0"), Some(-3000.0));
        assert!(parse_nodata("nan").unwrap().is_nan());
        assert_eq!(parse_nodata("none"), None);
    }
}

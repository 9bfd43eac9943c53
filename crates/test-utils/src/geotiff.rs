//! Minimal GeoTIFF writer for building synthetic product layers.
//!
//! Writes the same tags the product reader consumes: ModelPixelScale,
//! ModelTiepoint, GeoKeyDirectory, GDAL_NODATA and GDAL_METADATA.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_METADATA: u16 = 42112;
const GDAL_NODATA: u16 = 42113;

/// Georeferencing and metadata of a synthetic layer.
///
/// The default places the grid on unit cells with its lower-left corner at
/// (0, 0), so cell (col, row) covers x in `[col, col + 1]` and y in
/// `[height - row - 1, height - row]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTiffSpec {
    pub width: u32,
    pub height: u32,
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_size: f64,
    pub epsg: Option<u16>,
    pub nodata: Option<f64>,
    pub scale_factor: Option<f64>,
}

impl GeoTiffSpec {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            origin_x: 0.0,
            origin_y: height as f64,
            pixel_size: 1.0,
            epsg: Some(4326),
            nodata: None,
            scale_factor: None,
        }
    }

    pub fn with_origin(mut self, origin_x: f64, origin_y: f64) -> Self {
        self.origin_x = origin_x;
        self.origin_y = origin_y;
        self
    }

    pub fn with_pixel_size(mut self, pixel_size: f64) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    pub fn with_epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = Some(scale_factor);
        self
    }

    fn geo_keys(&self) -> Vec<u16> {
        // Header: version 1.1.0, key count patched below
        let mut keys = vec![1, 1, 0, 0];
        // GTRasterTypeGeoKey = RasterPixelIsArea
        keys.extend_from_slice(&[1025, 0, 1, 1]);
        if let Some(epsg) = self.epsg {
            let geographic = (4000..5000).contains(&epsg);
            // GTModelTypeGeoKey: 2 geographic, 1 projected
            keys.extend_from_slice(&[1024, 0, 1, if geographic { 2 } else { 1 }]);
            let key = if geographic { 2048 } else { 3072 };
            keys.extend_from_slice(&[key, 0, 1, epsg]);
        }
        keys[3] = ((keys.len() - 4) / 4) as u16;
        keys
    }

    fn gdal_metadata(&self) -> Option<String> {
        self.scale_factor.map(|scale| {
            format!(
                "<GDALMetadata>\n  <Item name=\"long_name\">synthetic layer</Item>\n  <Item name=\"scale_factor\">{}</Item>\n</GDALMetadata>",
                scale
            )
        })
    }
}

/// Write a 32-bit float layer.
pub fn write_geotiff_f32(path: impl AsRef<Path>, spec: &GeoTiffSpec, data: &[f32]) -> io::Result<()> {
    write_geotiff::<colortype::Gray32Float>(path.as_ref(), spec, data)
}

/// Write a 16-bit unsigned layer (quality bit fields, burn dates).
pub fn write_geotiff_u16(path: impl AsRef<Path>, spec: &GeoTiffSpec, data: &[u16]) -> io::Result<()> {
    write_geotiff::<colortype::Gray16>(path.as_ref(), spec, data)
}

/// Write an 8-bit unsigned layer (categorical masks).
pub fn write_geotiff_u8(path: impl AsRef<Path>, spec: &GeoTiffSpec, data: &[u8]) -> io::Result<()> {
    write_geotiff::<colortype::Gray8>(path.as_ref(), spec, data)
}

fn write_geotiff<C>(path: &Path, spec: &GeoTiffSpec, data: &[C::Inner]) -> io::Result<()>
where
    C: ColorType,
    [C::Inner]: TiffValue,
{
    if data.len() != (spec.width * spec.height) as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "data has {} cells, expected {}x{}",
                data.len(),
                spec.width,
                spec.height
            ),
        ));
    }

    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(to_io)?;
    let mut image = encoder
        .new_image::<C>(spec.width, spec.height)
        .map_err(to_io)?;

    let scale = [spec.pixel_size, spec.pixel_size, 0.0];
    image
        .encoder()
        .write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(to_io)?;

    let tiepoint = [0.0, 0.0, 0.0, spec.origin_x, spec.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(to_io)?;

    let keys = spec.geo_keys();
    image
        .encoder()
        .write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), &keys[..])
        .map_err(to_io)?;

    if let Some(nodata) = spec.nodata {
        let text = nodata.to_string();
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), text.as_str())
            .map_err(to_io)?;
    }

    if let Some(xml) = spec.gdal_metadata() {
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(GDAL_METADATA), xml.as_str())
            .map_err(to_io)?;
    }

    image.write_data(data).map_err(to_io)
}

fn to_io(err: tiff::TiffError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_keys_geographic() {
        let keys = GeoTiffSpec::new(2, 2).geo_keys();
        assert_eq!(keys[3], 3);
        assert_eq!(&keys[12..16], &[2048, 0, 1, 4326]);
    }

    #[test]
    fn test_geo_keys_projected() {
        let keys = GeoTiffSpec::new(2, 2).with_epsg(Some(32611)).geo_keys();
        assert_eq!(&keys[12..16], &[3072, 0, 1, 32611]);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_geotiff_f32(dir.path().join("x.tif"), &GeoTiffSpec::new(2, 2), &[1.0]);
        assert!(err.is_err());
    }

    #[test]
    fn test_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.tif");
        let spec = GeoTiffSpec::new(3, 2).with_nodata(-3000.0).with_scale_factor(0.0001);
        write_geotiff_f32(&path, &spec, &[0.0; 6]).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}

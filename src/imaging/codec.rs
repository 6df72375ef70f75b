//! Raster codec: decode source bytes, encode output JPEG

use image::codecs::jpeg::JpegEncoder;
use image::io::Reader as ImageReader;
use image::{ColorType, ImageEncoder as _};
use std::io::Cursor;

use super::raster::Raster;
use crate::error::ResizeError;

/// JPEG quality used when neither the configuration nor the mode chose one
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Content-Type of everything [`encode_jpeg`] produces
pub const OUTPUT_CONTENT_TYPE: &str = "image/jpeg";

/// Read the dimensions from the image header without decoding pixel data
pub fn probe_dimensions(data: &[u8]) -> Result<(u32, u32), ResizeError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ResizeError::decode_failed(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ResizeError::decode_failed(e.to_string()))
}

/// Decode image data into a raster
pub fn decode(data: &[u8]) -> Result<Raster, ResizeError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ResizeError::decode_failed(e.to_string()))?
        .decode()
        .map(Raster::new)
        .map_err(|e| ResizeError::decode_failed(e.to_string()))
}

/// Encode a raster as baseline JPEG
///
/// Uses the raster's own quality when set, [`DEFAULT_JPEG_QUALITY`] otherwise.
/// JPEG has no alpha channel, so transparent rasters are flattened to RGB.
pub fn encode_jpeg(raster: &Raster) -> Result<Vec<u8>, ResizeError> {
    let quality = raster.quality().unwrap_or(DEFAULT_JPEG_QUALITY);
    let rgb = raster.image().to_rgb8();

    let mut output = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut output, quality);

    encoder
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
        .map_err(|e| ResizeError::encode_failed("jpeg", e.to_string()))?;

    Ok(output.into_inner())
}

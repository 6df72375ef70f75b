//! Built-in modes

use image::{DynamicImage, Rgba, RgbaImage};

use super::geometry::{centre_offset, cover, fit_within, fits_inside};
use super::ImageMode;
use crate::imaging::{GeometryError, Raster};

fn require_target(width: u32, height: u32) -> Result<(), GeometryError> {
    if width == 0 || height == 0 {
        return Err(GeometryError::EmptyTarget { width, height });
    }
    Ok(())
}

/// Scale to exactly the requested size, ignoring aspect ratio
#[derive(Debug, Clone, Copy, Default)]
pub struct Stretch;

impl ImageMode for Stretch {
    fn resize(&self, raster: Raster, width: u32, height: u32) -> Result<Raster, GeometryError> {
        raster.scale_to(width, height)
    }
}

/// Scale to the largest size that fits inside the request, keeping aspect ratio
#[derive(Debug, Clone, Copy, Default)]
pub struct Fit;

impl ImageMode for Fit {
    fn resize(&self, raster: Raster, width: u32, height: u32) -> Result<Raster, GeometryError> {
        require_target(width, height)?;
        let (w, h) = fit_within(raster.dimensions(), (width, height));
        raster.scale_to(w, h)
    }
}

/// Cover the request keeping aspect ratio, then centre-crop to exactly the request
#[derive(Debug, Clone, Copy, Default)]
pub struct Fill;

impl ImageMode for Fill {
    fn resize(&self, raster: Raster, width: u32, height: u32) -> Result<Raster, GeometryError> {
        require_target(width, height)?;
        let covering = cover(raster.dimensions(), (width, height));
        let scaled = raster.scale_to(covering.0, covering.1)?;
        let (x, y) = centre_offset(covering, (width, height));
        scaled.crop(x, y, width, height)
    }
}

/// Like [`Fit`], but a source that already fits is left at its own size
#[derive(Debug, Clone, Copy, Default)]
pub struct Inside;

impl ImageMode for Inside {
    fn resize(&self, raster: Raster, width: u32, height: u32) -> Result<Raster, GeometryError> {
        require_target(width, height)?;
        if fits_inside(raster.dimensions(), (width, height)) {
            return Ok(raster);
        }
        Fit.resize(raster, width, height)
    }
}

/// [`Fit`] the source, then centre it on a canvas of exactly the requested size
#[derive(Debug, Clone, Copy)]
pub struct Pad {
    /// Canvas colour behind the letterboxed image
    pub background: [u8; 4],
}

impl Default for Pad {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
        }
    }
}

impl ImageMode for Pad {
    fn resize(&self, raster: Raster, width: u32, height: u32) -> Result<Raster, GeometryError> {
        let fitted = Fit.resize(raster, width, height)?;
        if fitted.dimensions() == (width, height) {
            return Ok(fitted);
        }

        let (x, y) = centre_offset((width, height), fitted.dimensions());
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba(self.background));
        image::imageops::overlay(&mut canvas, &fitted.image().to_rgba8(), x as i64, y as i64);

        Ok(fitted.with_image(DynamicImage::ImageRgba8(canvas)))
    }
}

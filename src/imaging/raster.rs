//! In-memory raster with virtual-canvas bookkeeping
//!
//! A [`Raster`] wraps a decoded [`DynamicImage`] together with the state the
//! executor manages around a mode call: the page geometry (virtual canvas and
//! offset), the resampling filter used by [`Raster::scale_to`], and an optional
//! encoder quality a mode may choose for itself.

use image::DynamicImage;

use super::resample;

/// Geometry errors raised by raster operations and image modes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("target dimensions {width}x{height} must be non-zero")]
    EmptyTarget { width: u32, height: u32 },

    #[error(
        "crop window {width}x{height}+{x}+{y} is outside source {source_width}x{source_height}"
    )]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        source_width: u32,
        source_height: u32,
    },

    #[error("target dimensions {width}x{height} exceed {limit}")]
    TooLarge {
        width: u32,
        height: u32,
        limit: String,
    },

    #[error("resample failed: {0}")]
    Resample(String),

    #[error("{0}")]
    Rejected(String),
}

/// Largest edge a raster may be scaled to; JPEG cannot encode anything wider
pub const MAX_EDGE: u32 = 65_535;

/// Reject targets that are empty or wider than [`MAX_EDGE`]
pub fn check_target(width: u32, height: u32) -> Result<(), GeometryError> {
    if width == 0 || height == 0 {
        return Err(GeometryError::EmptyTarget { width, height });
    }
    if width > MAX_EDGE || height > MAX_EDGE {
        return Err(GeometryError::TooLarge {
            width,
            height,
            limit: format!("{} pixels per edge", MAX_EDGE),
        });
    }
    Ok(())
}

/// Virtual canvas of a raster: canvas size plus the raster's offset on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl PageGeometry {
    /// Page covering exactly a `width`x`height` raster at the origin
    pub fn origin(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
        }
    }
}

/// Resampling filter applied when a raster is scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResampleFilter {
    Nearest,
    Box,
    #[default]
    Bilinear,
    CatmullRom,
    Mitchell,
    Lanczos3,
}

impl ResampleFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Box => "box",
            Self::Bilinear => "bilinear",
            Self::CatmullRom => "catmull_rom",
            Self::Mitchell => "mitchell",
            Self::Lanczos3 => "lanczos3",
        }
    }
}

/// Decoded image plus page, filter and quality state
#[derive(Debug, Clone)]
pub struct Raster {
    image: DynamicImage,
    page: PageGeometry,
    filter: ResampleFilter,
    quality: Option<u8>,
}

impl Raster {
    pub fn new(image: DynamicImage) -> Self {
        let page = PageGeometry::origin(image.width(), image.height());
        Self {
            image,
            page,
            filter: ResampleFilter::default(),
            quality: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn page(&self) -> PageGeometry {
        self.page
    }

    /// Reset the virtual canvas to the raster's own size at offset (0,0)
    pub fn repage(&mut self) {
        self.page = PageGeometry::origin(self.width(), self.height());
    }

    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: ResampleFilter) {
        self.filter = filter;
    }

    pub fn quality(&self) -> Option<u8> {
        self.quality
    }

    /// Set the encoder quality, clamped to 1-100
    pub fn set_quality(&mut self, quality: u8) {
        self.quality = Some(quality.clamp(1, 100));
    }

    /// Replace the pixel data, keeping filter and quality
    ///
    /// The page is reset to cover the new image at the origin.
    pub fn with_image(self, image: DynamicImage) -> Self {
        let page = PageGeometry::origin(image.width(), image.height());
        Self {
            image,
            page,
            filter: self.filter,
            quality: self.quality,
        }
    }

    /// Scale to exactly `width`x`height` using this raster's filter
    ///
    /// The page is scaled along with the pixels so an earlier crop offset
    /// stays proportional.
    pub fn scale_to(self, width: u32, height: u32) -> Result<Raster, GeometryError> {
        check_target(width, height)?;
        if (width, height) == self.dimensions() {
            return Ok(self);
        }

        let (src_w, src_h) = self.dimensions();
        let scaled = resample::resize(&self.image, width, height, self.filter)?;
        let page = scale_page(self.page, (src_w, src_h), (width, height));

        Ok(Raster {
            image: scaled,
            page,
            filter: self.filter,
            quality: self.quality,
        })
    }

    /// Cut a `width`x`height` window whose top-left corner is (`x`,`y`)
    ///
    /// The window must lie entirely inside the raster. The crop origin is
    /// recorded as the page offset until [`Raster::repage`] is called.
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Result<Raster, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyTarget { width, height });
        }

        let (src_w, src_h) = self.dimensions();
        let fits_x = x as u64 + width as u64 <= src_w as u64;
        let fits_y = y as u64 + height as u64 <= src_h as u64;
        if !fits_x || !fits_y {
            return Err(GeometryError::OutOfBounds {
                x,
                y,
                width,
                height,
                source_width: src_w,
                source_height: src_h,
            });
        }

        let cropped = self.image.crop_imm(x, y, width, height);
        let page = PageGeometry {
            width: self.page.width,
            height: self.page.height,
            x: self.page.x + x,
            y: self.page.y + y,
        };

        Ok(Raster {
            image: cropped,
            page,
            filter: self.filter,
            quality: self.quality,
        })
    }
}

fn scale_page(page: PageGeometry, from: (u32, u32), to: (u32, u32)) -> PageGeometry {
    let sx = to.0 as f64 / from.0 as f64;
    let sy = to.1 as f64 / from.1 as f64;
    PageGeometry {
        width: (page.width as f64 * sx).round() as u32,
        height: (page.height as f64 * sy).round() as u32,
        x: (page.x as f64 * sx).round() as u32,
        y: (page.y as f64 * sy).round() as u32,
    }
}

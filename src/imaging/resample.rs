//! Convolution resampling backed by `fast_image_resize`

use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::DynamicImage;
use std::num::NonZeroU32;

use super::raster::{GeometryError, ResampleFilter};

fn algorithm(filter: ResampleFilter) -> ResizeAlg {
    match filter {
        ResampleFilter::Nearest => ResizeAlg::Nearest,
        ResampleFilter::Box => ResizeAlg::Convolution(FilterType::Box),
        ResampleFilter::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
        ResampleFilter::CatmullRom => ResizeAlg::Convolution(FilterType::CatmullRom),
        ResampleFilter::Mitchell => ResizeAlg::Convolution(FilterType::Mitchell),
        ResampleFilter::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
    }
}

fn non_zero(value: u32, what: &str) -> Result<NonZeroU32, GeometryError> {
    NonZeroU32::new(value).ok_or_else(|| GeometryError::Resample(format!("{} is 0", what)))
}

/// Resize `img` to exactly `target_w`x`target_h`
///
/// Opaque images are resampled as RGB, anything with an alpha channel as RGBA.
pub fn resize(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
    filter: ResampleFilter,
) -> Result<DynamicImage, GeometryError> {
    let src_width = non_zero(img.width(), "Source width")?;
    let src_height = non_zero(img.height(), "Source height")?;
    let dst_width = non_zero(target_w, "Target width")?;
    let dst_height = non_zero(target_h, "Target height")?;

    let has_alpha = img.color().has_alpha();
    let (pixels, pixel_type) = if has_alpha {
        (img.to_rgba8().into_raw(), PixelType::U8x4)
    } else {
        (img.to_rgb8().into_raw(), PixelType::U8x3)
    };

    let src_image = Image::from_vec_u8(src_width, src_height, pixels, pixel_type)
        .map_err(|e| GeometryError::Resample(format!("Failed to create source image: {:?}", e)))?;

    let mut dst_image = Image::new(dst_width, dst_height, pixel_type);

    let mut resizer = Resizer::new(algorithm(filter));
    resizer
        .resize(&src_image.view(), &mut dst_image.view_mut())
        .map_err(|e| GeometryError::Resample(format!("Resize operation failed: {:?}", e)))?;

    let buf = dst_image.into_vec();
    if has_alpha {
        image::RgbaImage::from_raw(target_w, target_h, buf)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| GeometryError::Resample("Failed to create output buffer".to_string()))
    } else {
        image::RgbImage::from_raw(target_w, target_h, buf)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| GeometryError::Resample("Failed to create output buffer".to_string()))
    }
}

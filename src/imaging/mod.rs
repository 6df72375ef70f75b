//! Image transformation
//!
//! | Step | Module / function |
//! |---|---|
//! | Decode | [`codec::decode`] (`image` crate) |
//! | Scale | [`Raster::scale_to`] (`fast_image_resize`, Lanczos3 once selected) |
//! | Crop | [`Raster::crop`] (records the origin on the virtual canvas) |
//! | Repage | [`Raster::repage`] |
//! | Encode | [`codec::encode_jpeg`] (`image` JPEG encoder) |
//!
//! [`executor`] strings these together around a mode call.

pub mod codec;
pub mod executor;
mod raster;
mod resample;

pub use codec::{decode, encode_jpeg, probe_dimensions, DEFAULT_JPEG_QUALITY};
pub use executor::{
    execute, fullcrop_with_mode, resize_with_mode, TransformOutput, TransformRequest,
    TransformSettings,
};
pub use raster::{GeometryError, PageGeometry, Raster, ResampleFilter};

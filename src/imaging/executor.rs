//! Transform executor
//!
//! Synchronous, CPU-bound: decode → select filter → mode → repage → quality →
//! encode. Callers on an async runtime must run it through the worker pool.

use std::time::Instant;

use super::codec;
use super::raster::{self, GeometryError, Raster, ResampleFilter};
use crate::error::ResizeError;
use crate::modes::{ImageMode, ModeRegistry};

/// Filter selected for every scale a mode performs
pub const DEFAULT_FILTER: ResampleFilter = ResampleFilter::Lanczos3;

/// Read-only knobs applied around every mode call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSettings {
    /// Encoder quality; `None` keeps whatever the mode chose
    pub quality: Option<u8>,
    /// Reject sources with more pixels than this before decoding
    pub max_source_pixels: Option<u64>,
}

/// Which mode entry point to call, and with what geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformRequest {
    Resize {
        width: u32,
        height: u32,
        mode: String,
    },
    Fullcrop {
        x1: u32,
        y1: u32,
        width: u32,
        height: u32,
        mode: String,
    },
}

impl TransformRequest {
    pub fn mode(&self) -> &str {
        match self {
            TransformRequest::Resize { mode, .. } | TransformRequest::Fullcrop { mode, .. } => {
                mode
            }
        }
    }

    /// Requested output size
    pub fn target(&self) -> (u32, u32) {
        match *self {
            TransformRequest::Resize { width, height, .. }
            | TransformRequest::Fullcrop { width, height, .. } => (width, height),
        }
    }

    /// Label used for metrics and log lines
    pub fn kind(&self) -> &'static str {
        match self {
            TransformRequest::Resize { .. } => "resize",
            TransformRequest::Fullcrop { .. } => "fullcrop",
        }
    }

    fn apply(&self, mode: &dyn ImageMode, raster: Raster) -> Result<Raster, ResizeError> {
        let result = match *self {
            TransformRequest::Resize { width, height, .. } => mode.resize(raster, width, height),
            TransformRequest::Fullcrop {
                x1,
                y1,
                width,
                height,
                ..
            } => mode.fullcrop(raster, x1, y1, width, height),
        };
        result.map_err(|e| ResizeError::strategy_failed(self.mode(), e.to_string()))
    }
}

/// Encoded output of a transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// JPEG bytes
    pub data: Vec<u8>,
    /// Actual output width, as decided by the mode
    pub width: u32,
    /// Actual output height, as decided by the mode
    pub height: u32,
}

/// Run `request` against `source` and return the encoded result
pub fn execute(
    source: &[u8],
    request: &TransformRequest,
    modes: &ModeRegistry,
    settings: &TransformSettings,
) -> Result<TransformOutput, ResizeError> {
    let started = Instant::now();
    let raster = render(source, request, modes, settings)?;
    let data = codec::encode_jpeg(&raster)?;

    tracing::trace!(
        kind = request.kind(),
        mode = %request.mode(),
        filter = raster.filter().as_str(),
        width = raster.width(),
        height = raster.height(),
        bytes = data.len(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "Transform complete"
    );

    Ok(TransformOutput {
        data,
        width: raster.width(),
        height: raster.height(),
    })
}

/// Resize `source` to `width`x`height` through `mode`
pub fn resize_with_mode(
    source: &[u8],
    width: u32,
    height: u32,
    mode: &str,
    modes: &ModeRegistry,
    settings: &TransformSettings,
) -> Result<TransformOutput, ResizeError> {
    let request = TransformRequest::Resize {
        width,
        height,
        mode: mode.to_string(),
    };
    execute(source, &request, modes, settings)
}

/// Crop the window at (`x1`,`y1`) and resize it to `width`x`height` through `mode`
#[allow(clippy::too_many_arguments)]
pub fn fullcrop_with_mode(
    source: &[u8],
    x1: u32,
    y1: u32,
    width: u32,
    height: u32,
    mode: &str,
    modes: &ModeRegistry,
    settings: &TransformSettings,
) -> Result<TransformOutput, ResizeError> {
    let request = TransformRequest::Fullcrop {
        x1,
        y1,
        width,
        height,
        mode: mode.to_string(),
    };
    execute(source, &request, modes, settings)
}

/// Bound the output size before anything is decoded or allocated
fn check_target(
    (width, height): (u32, u32),
    settings: &TransformSettings,
) -> Result<(), GeometryError> {
    raster::check_target(width, height)?;
    if let Some(max_pixels) = settings.max_source_pixels {
        if width as u64 * height as u64 > max_pixels {
            return Err(GeometryError::TooLarge {
                width,
                height,
                limit: format!("{} pixels", max_pixels),
            });
        }
    }
    Ok(())
}

/// Everything up to (not including) encoding
fn render(
    source: &[u8],
    request: &TransformRequest,
    modes: &ModeRegistry,
    settings: &TransformSettings,
) -> Result<Raster, ResizeError> {
    let mode = modes.get(request.mode())?;

    check_target(request.target(), settings)
        .map_err(|e| ResizeError::strategy_failed(request.mode(), e.to_string()))?;

    if let Some(max_pixels) = settings.max_source_pixels {
        let (width, height) = codec::probe_dimensions(source)?;
        if width as u64 * height as u64 > max_pixels {
            return Err(ResizeError::source_too_large(width, height, max_pixels));
        }
    }

    let mut raster = codec::decode(source)?;
    raster.set_filter(DEFAULT_FILTER);

    let mut raster = request.apply(mode.as_ref(), raster)?;

    // Crops leave an offset on the virtual canvas; it must not reach the encoder
    raster.repage();

    // Unset means the mode may have picked its own quality
    if let Some(quality) = settings.quality {
        raster.set_quality(quality);
    }

    Ok(raster)
}

//! Resize stage error types
//!
//! Every failure the stage can surface is a [`ResizeError`]. Nothing is
//! recovered locally: decode, strategy, encode and worker failures all
//! propagate to the caller unchanged.

use std::fmt;

/// Errors that can occur while resizing a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeError {
    // === Payload Errors ===
    /// A field required by the selected path is absent
    MissingField { field: String },
    /// A field is present but has the wrong type or an out-of-range value
    InvalidField { field: String, message: String },

    // === Codec Errors ===
    /// Source bytes are not a decodable raster
    DecodeFailed { message: String },
    /// Encoding the output raster failed
    EncodeFailed { format: String, message: String },
    /// Source dimensions exceed the configured pixel budget (image bomb protection)
    SourceTooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    // === Mode Errors ===
    /// No mode is registered under the requested identifier
    UnknownMode { mode: String },
    /// The mode rejected its geometric parameters
    StrategyFailed { mode: String, message: String },

    // === Worker Errors ===
    /// The offloaded work did not finish before the configured deadline
    ProcessingTimeout { timeout_ms: u64 },
    /// The offloaded work panicked or was cancelled
    WorkerFailed { message: String },
}

impl fmt::Display for ResizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResizeError::MissingField { field } => {
                write!(f, "Missing required payload field '{}'", field)
            }
            ResizeError::InvalidField { field, message } => {
                write!(f, "Invalid payload field '{}': {}", field, message)
            }
            ResizeError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            ResizeError::EncodeFailed { format, message } => {
                write!(f, "Failed to encode to {}: {}", format, message)
            }
            ResizeError::SourceTooLarge {
                width,
                height,
                max_pixels,
            } => {
                write!(
                    f,
                    "Source dimensions {}x{} ({} pixels) exceed limit of {} pixels",
                    width,
                    height,
                    *width as u64 * *height as u64,
                    max_pixels
                )
            }
            ResizeError::UnknownMode { mode } => write!(f, "Unknown image mode '{}'", mode),
            ResizeError::StrategyFailed { mode, message } => {
                write!(f, "Mode '{}' failed: {}", mode, message)
            }
            ResizeError::ProcessingTimeout { timeout_ms } => {
                write!(f, "Processing timeout after {}ms", timeout_ms)
            }
            ResizeError::WorkerFailed { message } => write!(f, "Worker failed: {}", message),
        }
    }
}

impl std::error::Error for ResizeError {}

impl ResizeError {
    /// Short label used to tag metrics and log lines
    pub fn kind(&self) -> &'static str {
        match self {
            ResizeError::MissingField { .. } => "missing_field",
            ResizeError::InvalidField { .. } => "invalid_field",
            ResizeError::DecodeFailed { .. } => "decode",
            ResizeError::EncodeFailed { .. } => "encode",
            ResizeError::SourceTooLarge { .. } => "source_too_large",
            ResizeError::UnknownMode { .. } => "unknown_mode",
            ResizeError::StrategyFailed { .. } => "strategy",
            ResizeError::ProcessingTimeout { .. } => "timeout",
            ResizeError::WorkerFailed { .. } => "worker",
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        ResizeError::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ResizeError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn decode_failed(message: impl Into<String>) -> Self {
        ResizeError::DecodeFailed {
            message: message.into(),
        }
    }

    pub fn encode_failed(format: impl Into<String>, message: impl Into<String>) -> Self {
        ResizeError::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn unknown_mode(mode: impl Into<String>) -> Self {
        ResizeError::UnknownMode { mode: mode.into() }
    }

    pub fn strategy_failed(mode: impl Into<String>, message: impl Into<String>) -> Self {
        ResizeError::StrategyFailed {
            mode: mode.into(),
            message: message.into(),
        }
    }

    pub fn source_too_large(width: u32, height: u32, max_pixels: u64) -> Self {
        ResizeError::SourceTooLarge {
            width,
            height,
            max_pixels,
        }
    }
}

// Pipeline module - payload carried between stages and the stage contract

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

use crate::error::ResizeError;

pub mod resizer;

pub use resizer::Resizer;

/// Raw encoded source image
pub const ORIGINAL_IMAGE: &str = "original_image";
/// Presence flag: bypass transformation
pub const SKIP_RESIZE: &str = "skip_resize";
/// Presence flag: select the crop-then-resize path
pub const FULLCROP: &str = "fullcrop";
pub const MODE: &str = "mode";
pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const X1: &str = "x1";
pub const Y1: &str = "y1";
/// Output: re-encoded bytes
pub const IMAGE: &str = "image";
/// Output: actual width of the encoded raster
pub const RESIZED_WIDTH: &str = "resized_width";
/// Output: actual height of the encoded raster
pub const RESIZED_HEIGHT: &str = "resized_height";

/// A single payload value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bytes(Bytes),
    Int(i64),
    Text(String),
    Flag(bool),
}

impl Value {
    /// Type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "bytes",
            Value::Int(_) => "int",
            Value::Text(_) => "text",
            Value::Flag(_) => "flag",
        }
    }
}

impl From<Bytes> for Value {
    fn from(value: Bytes) -> Self {
        Value::Bytes(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(Bytes::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Flag(value)
    }
}

/// Mutable, string-keyed record flowing through the pipeline
///
/// Stages read the keys they need and merge their outputs back in. Flags
/// such as [`SKIP_RESIZE`] are tested by presence, not by value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    fields: BTreeMap<String, Value>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert `value` under `key`, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn required(&self, key: &str) -> Result<&Value, ResizeError> {
        self.get(key)
            .ok_or_else(|| ResizeError::missing_field(key))
    }

    /// Byte value under `key`
    ///
    /// Cloning [`Bytes`] is a reference-count bump, so the returned value can
    /// be moved onto a worker without copying the image.
    pub fn bytes(&self, key: &str) -> Result<Bytes, ResizeError> {
        match self.required(key)? {
            Value::Bytes(bytes) => Ok(bytes.clone()),
            other => Err(ResizeError::invalid_field(
                key,
                format!("expected bytes, found {}", other.type_name()),
            )),
        }
    }

    /// Integer value under `key` that is a valid pixel count or coordinate
    pub fn dimension(&self, key: &str) -> Result<u32, ResizeError> {
        match self.required(key)? {
            Value::Int(value) => u32::try_from(*value).map_err(|_| {
                ResizeError::invalid_field(key, format!("{} is not in 0..={}", value, u32::MAX))
            }),
            other => Err(ResizeError::invalid_field(
                key,
                format!("expected int, found {}", other.type_name()),
            )),
        }
    }

    /// Text value under `key`
    pub fn text(&self, key: &str) -> Result<&str, ResizeError> {
        match self.required(key)? {
            Value::Text(text) => Ok(text),
            other => Err(ResizeError::invalid_field(
                key,
                format!("expected text, found {}", other.type_name()),
            )),
        }
    }
}

/// One unit of an image-delivery pipeline
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Identifier used in metrics and log lines
    fn name(&self) -> &'static str;

    /// Transform `payload`, or fail leaving nothing half-merged
    async fn process(&self, payload: Payload) -> Result<Payload, ResizeError>;
}

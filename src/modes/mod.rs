//! Image modes
//!
//! A mode decides the output geometry of a transformation. The resize stage
//! never looks inside a mode: it resolves an identifier in the
//! [`ModeRegistry`] and calls one of the two entry points of [`ImageMode`].
//!
//! | Identifier | Type | Output geometry |
//! |---|---|---|
//! | `stretch` | [`Stretch`] | exactly W×H, aspect ignored |
//! | `fit` | [`Fit`] | fits inside W×H, aspect kept, may upscale |
//! | `fill` | [`Fill`] | covers W×H then centre-crops to exactly W×H |
//! | `inside` | [`Inside`] | like `fit`, never enlarges |
//! | `pad` | [`Pad`] | `fit` letterboxed onto a W×H background |
//!
//! Custom strategies (face-aware cropping, per-tenant quality, ...) are added
//! with [`ModeRegistry::register`].

mod builtin;
pub mod geometry;

pub use builtin::{Fill, Fit, Inside, Pad, Stretch};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ResizeError;
use crate::imaging::{GeometryError, Raster};

/// A resize/crop strategy
///
/// Implementations must be stateless with respect to a single call: the same
/// raster and parameters always produce the same output. Scaling should go
/// through [`Raster::scale_to`] so the filter selected by the executor applies.
pub trait ImageMode: Send + Sync {
    /// Transform `raster` for a `width`x`height` request
    fn resize(&self, raster: Raster, width: u32, height: u32) -> Result<Raster, GeometryError>;

    /// Transform the `width`x`height` window at (`x1`,`y1`) for a
    /// `width`x`height` request
    ///
    /// The default cuts the window and hands it to [`ImageMode::resize`].
    fn fullcrop(
        &self,
        raster: Raster,
        x1: u32,
        y1: u32,
        width: u32,
        height: u32,
    ) -> Result<Raster, GeometryError> {
        let window = raster.crop(x1, y1, width, height)?;
        self.resize(window, width, height)
    }
}

/// Read-only lookup table from mode identifier to strategy
#[derive(Clone, Default)]
pub struct ModeRegistry {
    modes: BTreeMap<String, Arc<dyn ImageMode>>,
}

impl ModeRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in mode registered under its identifier
    pub fn with_builtin_modes() -> Self {
        let mut registry = Self::new();
        registry.register("stretch", Stretch);
        registry.register("fit", Fit);
        registry.register("fill", Fill);
        registry.register("inside", Inside);
        registry.register("pad", Pad::default());
        registry
    }

    /// Register `mode` under `id`, replacing any previous registration
    pub fn register(&mut self, id: impl Into<String>, mode: impl ImageMode + 'static) {
        self.modes.insert(id.into(), Arc::new(mode));
    }

    /// Look up a mode by identifier
    pub fn get(&self, id: &str) -> Result<Arc<dyn ImageMode>, ResizeError> {
        self.modes
            .get(id)
            .cloned()
            .ok_or_else(|| ResizeError::unknown_mode(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modes.contains_key(id)
    }

    /// Registered identifiers in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl std::fmt::Debug for ModeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeRegistry")
            .field("modes", &self.modes.keys().collect::<Vec<_>>())
            .finish()
    }
}

//! Resize stage
//!
//! Picks exactly one path per payload:
//!
//! - `skip_resize` present: `image` is set to `original_image`, nothing is decoded
//! - `fullcrop` present: the `x1`/`y1` window is cropped, then resized through `mode`
//! - otherwise: the source is resized through `mode`
//!
//! The transformation runs on the [`WorkerPool`]; the only await point is the
//! pool boundary. Outputs (`image`, `resized_width`, `resized_height`) are
//! merged only after the work succeeded, so a failing payload is returned
//! to the caller exactly as it came in.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use super::{
    Payload, PipelineStage, Value, FULLCROP, HEIGHT, IMAGE, MODE, ORIGINAL_IMAGE, RESIZED_HEIGHT,
    RESIZED_WIDTH, SKIP_RESIZE, WIDTH, X1, Y1,
};
use crate::config::ResizerConfig;
use crate::error::ResizeError;
use crate::imaging::{self, TransformRequest, TransformSettings};
use crate::metrics::Metrics;
use crate::modes::ModeRegistry;
use crate::offload::WorkerPool;

/// Identifier used for metrics and log lines
pub const STAGE_NAME: &str = "resizer";

const OUTCOME_SKIP: &str = "skip";

pub struct Resizer {
    modes: Arc<ModeRegistry>,
    metrics: Arc<Metrics>,
    pool: WorkerPool,
    settings: TransformSettings,
    debug: bool,
}

impl Resizer {
    pub fn new(config: &ResizerConfig, modes: Arc<ModeRegistry>, metrics: Arc<Metrics>) -> Self {
        let mut pool = WorkerPool::new(config.workers);
        if let Some(timeout) = config.timeout() {
            pool = pool.with_timeout(timeout);
        }

        Self {
            modes,
            metrics,
            pool,
            settings: config.transform_settings(),
            debug: config.debug,
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Process an owned payload and hand it back
    pub async fn process(&self, mut payload: Payload) -> Result<Payload, ResizeError> {
        self.process_in_place(&mut payload).await?;
        Ok(payload)
    }

    /// Process `payload` in place; on failure it is left untouched
    pub async fn process_in_place(&self, payload: &mut Payload) -> Result<(), ResizeError> {
        let started = Instant::now();
        let result = self.dispatch(payload).await;

        let outcome = match &result {
            Ok(outcome) => *outcome,
            Err(e) => {
                tracing::warn!(stage = STAGE_NAME, error = %e, kind = e.kind(), "Resize failed");
                e.kind()
            }
        };
        self.metrics
            .record_stage(STAGE_NAME, outcome, started.elapsed());

        // Skip returns before any image work, so it has nothing to trace
        if result.is_ok() && self.debug && outcome != OUTCOME_SKIP {
            let bytes = match payload.get(IMAGE) {
                Some(Value::Bytes(bytes)) => bytes.len(),
                _ => 0,
            };
            tracing::debug!(
                stage = STAGE_NAME,
                timestamp = %chrono::Utc::now().to_rfc3339(),
                outcome = outcome,
                bytes = bytes,
                "Resizer produced image"
            );
        }

        result.map(|_| ())
    }

    async fn dispatch(&self, payload: &mut Payload) -> Result<&'static str, ResizeError> {
        if payload.contains(SKIP_RESIZE) {
            let original = payload
                .get(ORIGINAL_IMAGE)
                .cloned()
                .ok_or_else(|| ResizeError::missing_field(ORIGINAL_IMAGE))?;
            payload.insert(IMAGE, original);
            return Ok(OUTCOME_SKIP);
        }

        let request = transform_request(payload)?;
        let source = payload.bytes(ORIGINAL_IMAGE)?;
        let kind = request.kind();

        let modes = Arc::clone(&self.modes);
        let settings = self.settings;
        let output = self
            .pool
            .run(move || imaging::execute(&source, &request, &modes, &settings))
            .await?;

        self.metrics.add_bytes_out(output.data.len() as u64);
        payload.insert(IMAGE, output.data);
        payload.insert(RESIZED_WIDTH, output.width);
        payload.insert(RESIZED_HEIGHT, output.height);

        Ok(kind)
    }
}

/// Read the transformation parameters the payload asks for
fn transform_request(payload: &Payload) -> Result<TransformRequest, ResizeError> {
    if payload.contains(FULLCROP) {
        Ok(TransformRequest::Fullcrop {
            x1: payload.dimension(X1)?,
            y1: payload.dimension(Y1)?,
            width: payload.dimension(WIDTH)?,
            height: payload.dimension(HEIGHT)?,
            mode: payload.text(MODE)?.to_string(),
        })
    } else {
        Ok(TransformRequest::Resize {
            width: payload.dimension(WIDTH)?,
            height: payload.dimension(HEIGHT)?,
            mode: payload.text(MODE)?.to_string(),
        })
    }
}

#[async_trait]
impl PipelineStage for Resizer {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    async fn process(&self, payload: Payload) -> Result<Payload, ResizeError> {
        Resizer::process(self, payload).await
    }
}

impl std::fmt::Debug for Resizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resizer")
            .field("modes", &self.modes)
            .field("pool", &self.pool)
            .field("settings", &self.settings)
            .field("debug", &self.debug)
            .finish()
    }
}

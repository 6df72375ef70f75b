use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use image_resizer::config::Config;
use image_resizer::imaging::codec::OUTPUT_CONTENT_TYPE;
use image_resizer::metrics::Metrics;
use image_resizer::modes::ModeRegistry;
use image_resizer::pipeline::{
    self, Payload, Resizer, FULLCROP, HEIGHT, MODE, ORIGINAL_IMAGE, SKIP_RESIZE, WIDTH, X1, Y1,
};

/// Image Resizer - resize or crop-then-resize an image through a named mode
#[derive(Parser, Debug)]
#[command(name = "image-resizer")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source image
    #[arg(short, long, required_unless_present = "list_modes")]
    input: Option<PathBuf>,

    /// Where to write the encoded result
    #[arg(short, long, required_unless_present = "list_modes")]
    output: Option<PathBuf>,

    /// Target width
    #[arg(long)]
    width: Option<u32>,

    /// Target height
    #[arg(long)]
    height: Option<u32>,

    /// Mode identifier (see --list-modes)
    #[arg(short, long, default_value = "fit")]
    mode: String,

    /// Crop the window at --x1/--y1 before resizing
    #[arg(long, requires_all = ["x1", "y1"])]
    fullcrop: bool,

    /// Crop origin x (with --fullcrop)
    #[arg(long)]
    x1: Option<u32>,

    /// Crop origin y (with --fullcrop)
    #[arg(long)]
    y1: Option<u32>,

    /// Copy the source through unchanged
    #[arg(long, conflicts_with = "fullcrop")]
    skip_resize: bool,

    /// Print registered mode identifiers and exit
    #[arg(long)]
    list_modes: bool,

    /// Print metrics in Prometheus format after processing
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    config.validate().context("Invalid configuration")?;

    image_resizer::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let modes = Arc::new(ModeRegistry::with_builtin_modes());
    if args.list_modes {
        for id in modes.ids() {
            println!("{}", id);
        }
        return Ok(());
    }

    tracing::info!(
        workers = config.resizer.workers,
        image_quality = ?config.resizer.image_quality,
        timeout_ms = ?config.resizer.timeout_ms,
        debug = config.resizer.debug,
        "Configuration loaded successfully"
    );

    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        bail!("--input and --output are required");
    };

    let source = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let payload = build_payload(&args, source);

    let metrics = Arc::new(Metrics::new());
    let stage = Resizer::new(&config.resizer, modes, metrics.clone());
    let result = stage.process(payload).await?;

    let image = result.bytes(pipeline::IMAGE)?;
    tokio::fs::write(output, &image)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(
        output = %output.display(),
        content_type = OUTPUT_CONTENT_TYPE,
        bytes = image.len(),
        width = ?result.dimension(pipeline::RESIZED_WIDTH).ok(),
        height = ?result.dimension(pipeline::RESIZED_HEIGHT).ok(),
        "Image written"
    );

    if args.metrics {
        print!("{}", metrics.export_prometheus());
    }

    Ok(())
}

/// Flags become payload keys; omitted values stay absent so the stage reports them
fn build_payload(args: &Args, source: Vec<u8>) -> Payload {
    let mut payload = Payload::new()
        .with(ORIGINAL_IMAGE, source)
        .with(MODE, args.mode.as_str());

    if args.skip_resize {
        payload.insert(SKIP_RESIZE, true);
    }
    if args.fullcrop {
        payload.insert(FULLCROP, true);
    }
    for (key, value) in [
        (WIDTH, args.width),
        (HEIGHT, args.height),
        (X1, args.x1),
        (Y1, args.y1),
    ] {
        if let Some(value) = value {
            payload.insert(key, value);
        }
    }
    payload
}

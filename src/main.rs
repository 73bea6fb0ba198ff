use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fridge_scan::config::ScanConfig;
use fridge_scan::core::SurfacePool;
use fridge_scan::scan::{preprocess_batch_with, scan_and_analyze_with};
use fridge_scan::{CancelToken, GeminiClient, Preprocessor, ProcessedImage, SourceImage};

/// Shrink fridge photos into upload-ready JPEG payloads and optionally ask
/// a Gemini vision model about them.
#[derive(Parser, Debug)]
#[command(name = "fridge-scan")]
#[command(about = "Scale, enhance and compress photos for a vision model")]
#[command(long_about = "Scale, enhance and compress photos for a vision model.
Each image is fitted into the bounding box, brightened or darkened by average
luma, then re-encoded at decreasing JPEG quality until it fits the size target.")]
struct Args {
    /// Source photos (JPEG, PNG, WebP, ...)
    #[arg(required = true, help = "Images to preprocess, in scan order")]
    images: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, help = "JSON file with `preprocess`, `limits` and `vision` sections")]
    config: Option<PathBuf>,

    #[arg(long, help = "Maximum output width in pixels (default 1920)")]
    max_width: Option<u32>,

    #[arg(long, help = "Maximum output height in pixels (default 1080)")]
    max_height: Option<u32>,

    #[arg(short, long, help = "Starting JPEG quality in (0, 1] (default 0.85)")]
    quality: Option<f32>,

    #[arg(short = 't', long, help = "Target payload size in KB (default 500)")]
    target_kb: Option<u32>,

    #[arg(long, help = "Skip the brightness/contrast pass")]
    no_enhance: bool,

    /// Where to write the processed JPEGs
    #[arg(short, long, help = "Write <stem>.jpg for each processed image into this directory")]
    out_dir: Option<PathBuf>,

    /// Send the whole scan to the vision model
    #[arg(long, requires = "prompt", help = "Send the processed images to the vision model")]
    analyze: bool,

    #[arg(short, long, help = "Prompt text sent ahead of the images")]
    prompt: Option<String>,

    #[arg(long, help = "Gemini API key (defaults to the env var named in the config)")]
    api_key: Option<String>,

    #[arg(long, help = "Gemini model name, e.g. gemini-1.5-flash")]
    model: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageReport {
    source: String,
    width: u32,
    height: u32,
    #[serde(rename = "sizeKB")]
    size_kb: u32,
    quality: f32,
    iterations: u32,
}

#[derive(Serialize)]
struct Report {
    images: Vec<ImageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fridge_scan=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let sources = args
        .images
        .iter()
        .map(|path| SourceImage::from_path(path).with_context(|| format!("Failed to read {}", path.display())))
        .collect::<Result<Vec<_>>>()?;
    let labels: Vec<String> = sources.iter().map(|s| s.label().to_string()).collect();

    let pool = Arc::new(SurfacePool::new(sources.len().clamp(1, 4)));
    let preprocessor = Preprocessor::new(config.preprocess.clone())
        .context("Invalid preprocessing options")?
        .with_limits(config.limits)
        .with_pool(pool);

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining work");
            on_interrupt.cancel();
        }
    });

    let preprocessor = Arc::new(preprocessor);
    let (processed, analysis) = if args.analyze {
        let client = vision_client(&args, &config)?;
        let prompt = args.prompt.as_deref().unwrap_or_default();
        let outcome = scan_and_analyze_with(&client, prompt, preprocessor, sources, cancel)
            .await
            .with_context(|| format!("Scan with {} failed", client.model()))?;
        (outcome.images, Some(outcome.text))
    } else {
        let images = preprocess_batch_with(preprocessor, sources, cancel)
            .await
            .context("Preprocessing failed")?;
        (images, None)
    };

    if let Some(dir) = &args.out_dir {
        write_outputs(dir, &labels, &processed)?;
    }

    let report = Report {
        images: labels
            .into_iter()
            .zip(&processed)
            .map(|(source, p)| ImageReport {
                source,
                width: p.width,
                height: p.height,
                size_kb: p.size_kb,
                quality: p.quality,
                iterations: p.iterations,
            })
            .collect(),
        analysis,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Config file (or built-ins) with command-line overrides applied.
fn load_config(args: &Args) -> Result<ScanConfig> {
    let mut config = match &args.config {
        Some(path) => ScanConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ScanConfig::default(),
    };

    let options = &mut config.preprocess;
    if let Some(w) = args.max_width {
        options.max_width = w;
    }
    if let Some(h) = args.max_height {
        options.max_height = h;
    }
    if let Some(q) = args.quality {
        options.quality = q;
    }
    if let Some(kb) = args.target_kb {
        options.target_size_kb = kb;
    }
    if args.no_enhance {
        options.auto_enhance = false;
    }
    if let Some(model) = &args.model {
        config.vision.model = model.clone();
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn write_outputs(dir: &Path, labels: &[String], processed: &[ProcessedImage]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    for (label, image) in labels.iter().zip(processed) {
        let stem = Path::new(label)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image");
        let path = dir.join(format!("{stem}.jpg"));
        std::fs::write(&path, image.jpeg_bytes()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), size_kb = image.size_kb, "Wrote processed image");
    }
    Ok(())
}

fn vision_client(args: &Args, config: &ScanConfig) -> Result<GeminiClient> {
    match &args.api_key {
        Some(key) => GeminiClient::new(&config.vision, key.clone()),
        None => GeminiClient::from_env(&config.vision),
    }
    .context("Cannot create the Gemini client")
}

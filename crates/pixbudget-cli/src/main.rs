//! `pixbudget` - re-encode an image file so it fits a byte budget.

mod logging;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use pixbudget_core::{EncodeRequest, EncodeResult, Engine, EngineConfig, EngineError, OutputFormat};
use serde::Serialize;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "pixbudget")]
#[command(version, about = "Re-encode an image so it fits a strict byte budget", long_about = None)]
struct Cli {
    /// Source image (JPEG, PNG, WebP or GIF)
    #[arg(value_name = "INPUT", required_unless_present = "capabilities")]
    input: Option<PathBuf>,

    /// Where to write the encoded image [default: <stem>.budget.<ext> next to INPUT]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum output size in bytes
    #[arg(short, long)]
    target_bytes: Option<u64>,

    /// Baseline quality, 1-100
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Output format: jpeg (jpg), png or webp
    #[arg(short, long)]
    format: Option<String>,

    /// JSON engine configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the result as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Print supported formats and the active policy, then exit
    #[arg(long)]
    capabilities: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// What `--json` prints: the engine result plus where the bytes went.
#[derive(Serialize)]
struct Report<'a> {
    output: &'a Path,
    mime_type: &'static str,
    compression_ratio: String,
    #[serde(flatten)]
    result: &'a EncodeResult,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let engine = Engine::new(config);

    if cli.capabilities {
        println!("{}", serde_json::to_string_pretty(&engine.capabilities())?);
        return Ok(());
    }

    let input = cli
        .input
        .as_deref()
        .context("an input image is required")?;
    let raw = fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;

    let request = EncodeRequest::from_options(
        cli.target_bytes,
        cli.quality,
        cli.format.as_deref(),
        engine.config(),
    )?;

    let result = engine
        .transcode(&raw, &request)
        .inspect_err(|e| {
            if let EngineError::TargetUnreachable {
                best_size,
                budget,
                attempts,
            } = e
            {
                error!(best_size, budget, attempts = attempts.len(), "Budget not reached");
            }
        })
        .with_context(|| format!("failed to transcode {}", input.display()))?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(input, result.format));
    fs::write(&output, &result.bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(path = %output.display(), size = result.final_size, "Wrote output");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&Report::new(&output, &result))?);
    } else {
        print_summary(&output, &result);
    }

    Ok(())
}

impl<'a> Report<'a> {
    fn new(output: &'a Path, result: &'a EncodeResult) -> Self {
        Self {
            output,
            mime_type: result.format.mime_type(),
            compression_ratio: result.compression_ratio_label(),
            result,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// `photos/cat.png` + WebP -> `photos/cat.budget.webp`
fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{stem}.budget.{}", format.extension()))
}

fn print_summary(output: &Path, result: &EncodeResult) {
    println!("Output:      {}", output.display());
    println!("Format:      {} ({})", result.format, result.format.mime_type());
    println!(
        "Size:        {} bytes (from {} bytes, {} saved)",
        result.final_size,
        result.original_size,
        result.compression_ratio_label()
    );
    if let Some(last) = result.final_attempt() {
        println!(
            "Dimensions:  {}x{} at quality {} (attempt {} of {})",
            last.width,
            last.height,
            last.quality,
            last.index,
            result.attempts.len()
        );
    }
    println!("SHA-256:     {}", result.digest);
}

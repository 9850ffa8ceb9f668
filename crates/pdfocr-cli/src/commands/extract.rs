//! Extract command - pull the text out of a PDF.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use pdfocr_core::PageRange;

use super::{load_config, run_extraction};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Zero-based page range START:END (end exclusive)
    #[arg(short, long)]
    pages: Option<PageRange>,

    /// Skip the text layer and OCR every page
    #[arg(long)]
    ocr: bool,

    /// Directory holding the OCR models
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Do not correct page skew before OCR
    #[arg(long)]
    no_deskew: bool,

    /// Do not denoise page images before OCR
    #[arg(long)]
    no_denoise: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with success flag and text
    Json,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.model_dir {
        config.models.model_dir = dir.clone();
    }
    if args.no_deskew {
        config.preprocess.deskew = false;
    }
    if args.no_denoise {
        config.preprocess.denoise = false;
    }

    info!("Extracting text from {}", args.input.display());

    let input = args.input.clone();
    let range = args.pages;
    let force_ocr = args.ocr;

    let outcome = run_extraction(config, move |extractor, progress| {
        if force_ocr {
            extractor.extract_text_with_ocr(&input, range, Some(progress))
        } else {
            extractor.extract_text(&input, range, Some(progress))
        }
    })
    .await?;

    if !outcome.success {
        anyhow::bail!("{}", outcome.text);
    }

    let output = match args.format {
        OutputFormat::Text => outcome.text.clone(),
        OutputFormat::Json => serde_json::to_string_pretty(&outcome)?,
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if outcome.is_ocr_derived() {
        eprintln!("{} Text layer was insufficient, OCR was used", style("ℹ").blue());
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

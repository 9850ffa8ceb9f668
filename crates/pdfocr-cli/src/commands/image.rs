//! Image command - OCR a standalone image.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use super::{load_config, run_extraction};

/// Arguments for the image command.
#[derive(Args)]
pub struct ImageArgs {
    /// Input image (PNG, JPEG, TIFF, BMP, ...)
    #[arg(required = true)]
    input: PathBuf,

    /// Directory holding the OCR models
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: ImageArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.model_dir {
        config.models.model_dir = dir.clone();
    }

    let input = args.input.clone();
    let outcome = run_extraction(config, move |extractor, _progress| {
        extractor.extract_text_from_image(&input)
    })
    .await?;

    if !outcome.success {
        anyhow::bail!("{}", outcome.text);
    }

    match &args.output {
        Some(output_path) => {
            fs::write(output_path, &outcome.text)?;
            println!(
                "{} Output written to {}",
                style("✓").green(),
                output_path.display()
            );
        }
        None => println!("{}", outcome.text),
    }

    Ok(())
}

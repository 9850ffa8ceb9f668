//! Subcommands and the helpers they share.

pub mod config;
pub mod extract;
pub mod image;
pub mod info;
pub mod search;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use pdfocr_core::{ExtractionOutcome, PdfOcrConfig, ProgressEvent, ProgressSink, TextExtractor};

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pdfocr")
        .join("config.json")
}

/// Config from `--config`, else the default location, else built-in defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<PdfOcrConfig> {
    if let Some(path) = path {
        return PdfOcrConfig::from_file(Path::new(path))
            .with_context(|| format!("failed to read config file {}", path));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        PdfOcrConfig::from_file(&default_path)
            .with_context(|| format!("failed to read config file {}", default_path.display()))
    } else {
        Ok(PdfOcrConfig::default())
    }
}

/// Run an extraction on a blocking worker while a spinner shows its progress.
///
/// The extractor is built on the worker and never leaves it.
pub async fn run_extraction<F>(config: PdfOcrConfig, job: F) -> anyhow::Result<ExtractionOutcome>
where
    F: FnOnce(&TextExtractor, &dyn ProgressSink) -> ExtractionOutcome + Send + 'static,
{
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Extracting text...");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let worker = tokio::task::spawn_blocking(move || {
        let extractor = TextExtractor::new(config);
        let sink = move |event: &ProgressEvent| {
            // The receiver only goes away once the worker is done
            let _ = tx.send(event.to_string());
        };
        job(&extractor, &sink)
    });

    while let Some(message) = rx.recv().await {
        pb.set_message(message);
    }

    let outcome = worker.await.context("extraction worker panicked")?;
    pb.finish_and_clear();

    Ok(outcome)
}

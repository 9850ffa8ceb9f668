//! Fallback reader driving the `tesseract` command-line tool.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

use crate::error::OcrError;

use super::{Backend, OcrResult, ReadMode, TextReader};

/// Runs `tesseract <image> stdout -l <language>`.
#[derive(Debug, Clone)]
pub struct TesseractReader {
    command: String,
    language: String,
    temp_root: Option<PathBuf>,
}

impl Default for TesseractReader {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TesseractReader {
    pub fn new(command: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            language: language.into(),
            temp_root: None,
        }
    }

    /// Write the scratch PNG under `root` instead of the system temp dir.
    pub fn with_temp_root(mut self, root: Option<PathBuf>) -> Self {
        self.temp_root = root;
        self
    }
}

impl TextReader for TesseractReader {
    fn backend(&self) -> Backend {
        Backend::Tesseract
    }

    fn read(&self, image: &DynamicImage, _mode: ReadMode) -> Result<OcrResult, OcrError> {
        let start = Instant::now();

        let mut builder = tempfile::Builder::new();
        builder.prefix("pdfocr_tess_").suffix(".png");
        let input = match &self.temp_root {
            Some(root) => builder.tempfile_in(root),
            None => builder.tempfile(),
        }
        .map_err(|e| OcrError::Recognition(format!("failed to create temp file: {}", e)))?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

        let output = Command::new(&self.command)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    OcrError::BackendUnavailable(format!("{} not found in PATH", self.command))
                } else {
                    OcrError::Recognition(format!("failed to run {}: {}", self.command, e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "{} failed: {}",
                self.command,
                stderr.trim()
            )));
        }

        let text = clean_output(&String::from_utf8_lossy(&output.stdout));
        let elapsed = start.elapsed().as_millis() as u64;
        debug!("tesseract read {} chars in {}ms", text.len(), elapsed);

        // tesseract already separates paragraphs with blank lines
        Ok(OcrResult::from_text(&text, image.dimensions()).with_elapsed(elapsed))
    }
}

/// Drop the page-separator form feeds tesseract emits.
fn clean_output(raw: &str) -> String {
    raw.replace('\x0c', "")
}

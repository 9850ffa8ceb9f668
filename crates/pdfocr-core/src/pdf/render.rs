//! Page rasterization through poppler's `pdftoppm`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::Result;
use crate::error::PdfError;

/// Renders single pages to PNG files.
#[derive(Debug, Clone)]
pub struct PageRasterizer {
    command: String,
}

impl Default for PageRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PageRasterizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Render zero-based `page` of `pdf` at `dpi` into `dest` (a `.png` path).
    pub fn render(&self, pdf: &Path, page: u32, dpi: u32, dest: &Path) -> Result<PathBuf> {
        // pdftoppm appends the extension itself
        let prefix = dest.with_extension("");
        let page_arg = (page + 1).to_string();

        debug!("Rendering page {} of {} at {} DPI", page, pdf.display(), dpi);

        let output = Command::new(&self.command)
            .arg("-f")
            .arg(&page_arg)
            .arg("-l")
            .arg(&page_arg)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    PdfError::Render(format!(
                        "{} not found (install poppler-utils)",
                        self.command
                    ))
                } else {
                    PdfError::Render(format!("failed to run {}: {}", self.command, e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfError::Render(format!(
                "{} failed: {}",
                self.command,
                stderr.trim()
            )));
        }

        let rendered = prefix.with_extension("png");
        if !rendered.exists() {
            return Err(PdfError::Render(format!(
                "{} produced no output for page {}",
                self.command, page
            )));
        }

        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_command_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let rasterizer = PageRasterizer::new("pdfocr-no-such-rasterizer");

        let err = rasterizer
            .render(
                &dir.path().join("in.pdf"),
                0,
                200,
                &dir.path().join("page_0_full.png"),
            )
            .unwrap_err();

        assert!(matches!(err, PdfError::Render(ref msg) if msg.contains("not found")));
    }
}

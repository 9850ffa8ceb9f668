//! Page-by-page OCR of a PDF.

use std::ops::Range;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::PdfOcrConfig;
use crate::error::{PdfOcrError, Result};
use crate::ocr::{ImagePreprocessor, OcrEngine, ReadMode, TextCleaner, load_image};
use crate::outcome::{ExtractionOutcome, NO_OCR_TEXT, PAGE_BREAK};
use crate::pdf::{DocumentOpener, PageRange, PdfProcessor, pages_to_process};

use super::progress::{ProgressEvent, ProgressSink, report};

/// Borrowed view of the parts one OCR run needs.
pub(crate) struct OcrPipeline<'a> {
    pub opener: &'a dyn DocumentOpener,
    pub engine: &'a OcrEngine,
    pub preprocessor: &'a ImagePreprocessor,
    pub cleaner: &'a TextCleaner,
    pub config: &'a PdfOcrConfig,
}

impl OcrPipeline<'_> {
    /// OCR the pages of `path` in `range`, reporting sentinel text for an
    /// empty result and a prefixed message on failure.
    pub fn run(
        &self,
        path: &Path,
        range: Option<PageRange>,
        progress: Option<&dyn ProgressSink>,
    ) -> ExtractionOutcome {
        match self.run_raw(path, range, progress) {
            Ok(text) if text.trim().is_empty() => ExtractionOutcome::ok(NO_OCR_TEXT),
            Ok(text) => ExtractionOutcome::ok(text),
            Err(e) => ExtractionOutcome::failed(format!("OCR extraction failed: {}", e)),
        }
    }

    /// OCR text of the pages, joined with the page-break marker; empty when
    /// nothing was recognized.
    ///
    /// All intermediate images live in a fresh temp directory that is removed
    /// when this returns, whatever the outcome.
    pub fn run_raw(
        &self,
        path: &Path,
        range: Option<PageRange>,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<String> {
        let workspace = self.workspace()?;
        debug!("OCR workspace: {}", workspace.path().display());

        let document = self.opener.open(path)?;
        let pages = pages_to_process(range, document.page_count());
        info!("Running OCR on {} page(s) of {}", pages.len(), path.display());

        report(progress, ProgressEvent::LoadingModel);
        self.engine.ensure_loaded();

        let page_texts = self.ocr_pages(document.as_ref(), pages, workspace.path(), progress)?;
        Ok(page_texts.join(PAGE_BREAK))
    }

    fn workspace(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("pdf_ocr_");
        let dir = match &self.config.ocr.temp_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn ocr_pages(
        &self,
        document: &dyn PdfProcessor,
        pages: Range<u32>,
        workspace: &Path,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<String>> {
        let total = pages.len() as u32;
        let mut page_texts = Vec::new();

        for (position, page) in pages.enumerate() {
            let current = position as u32 + 1;
            report(progress, ProgressEvent::Page { current, total });

            let images = document.page_images(page)?;
            let mut parts = Vec::new();

            if images.is_empty() {
                match self.ocr_rendered_page(document, page, workspace) {
                    Ok(Some(text)) => parts.push(text),
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Page {} could not be rendered: {}", page, e);
                        parts.push(format!("[Error rendering page {}: {}]", page, e));
                    }
                }
            } else {
                let total_images = images.len() as u32;
                for (index, image) in images.iter().enumerate() {
                    if total_images > 1 {
                        report(
                            progress,
                            ProgressEvent::Image {
                                page: current,
                                total_pages: total,
                                image: index as u32 + 1,
                                total_images,
                            },
                        );
                    }

                    let result = document
                        .extract_image(image)
                        .map_err(PdfOcrError::from)
                        .and_then(|extracted| {
                            let dest = workspace
                                .join(format!("page_{}_img_{}.{}", page, index, extracted.format));
                            std::fs::write(&dest, &extracted.data)?;
                            self.ocr_file(&dest)
                        });

                    match result {
                        Ok(Some(text)) => parts.push(text),
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Image {} on page {} failed: {}", index, page, e);
                            parts.push(format!("[Error extracting image {}: {}]", index, e));
                        }
                    }
                }
            }

            if parts.is_empty() {
                debug!("Page {}: no text recognized", page);
            } else {
                page_texts.push(parts.join("\n"));
            }
        }

        Ok(page_texts)
    }

    fn ocr_rendered_page(
        &self,
        document: &dyn PdfProcessor,
        page: u32,
        workspace: &Path,
    ) -> Result<Option<String>> {
        let dest = workspace.join(format!("page_{}_full.png", page));
        let rendered = document.render_page(page, self.config.pdf.render_dpi, &dest)?;
        self.ocr_file(&rendered)
    }

    /// Preprocess, recognize and clean one image file; `None` if no text.
    fn ocr_file(&self, source: &Path) -> Result<Option<String>> {
        let processed: PathBuf = self.preprocessor.preprocess(source).value();

        let image = load_image(&processed)?;
        let result = self.engine.read_text(&image, ReadMode::Lines)?;
        let cleaned = self.cleaner.clean(&result.text);
        let trimmed = cleaned.trim();

        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{Backend, TextReader};
    use crate::pdf::PdfOpener;
    use crate::testutil::{self, MockReader};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[test]
    fn test_embedded_image_of_real_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_image_pdf(dir.path());

        let reader = MockReader::new(Backend::Tesseract, "  scanned I text  ");
        let calls = reader.calls();
        let modes = reader.modes();
        let engine = OcrEngine::new(None, Box::new(reader) as Box<dyn TextReader>);

        let mut config = PdfOcrConfig::default();
        config.ocr.temp_root = Some(dir.path().to_path_buf());
        let preprocessor = ImagePreprocessor::new(config.preprocess.clone());
        let cleaner = TextCleaner::new();
        let opener = PdfOpener::default();
        let pipeline = OcrPipeline {
            opener: &opener,
            engine: &engine,
            preprocessor: &preprocessor,
            cleaner: &cleaner,
            config: &config,
        };

        let events = RefCell::new(Vec::new());
        let sink = |event: &ProgressEvent| events.borrow_mut().push(*event);
        let outcome = pipeline.run(&path, None, Some(&sink));

        assert_eq!(outcome, ExtractionOutcome::ok("scanned 1 text"));
        assert_eq!(calls.get(), 1);
        assert_eq!(*modes.borrow(), vec![ReadMode::Lines]);
        assert_eq!(
            *events.borrow(),
            vec![
                ProgressEvent::LoadingModel,
                ProgressEvent::Page { current: 1, total: 1 },
            ]
        );

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("scan.pdf")]);
    }
}

//! Native-first text extraction with automatic OCR escalation.

use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::config::PdfOcrConfig;
use crate::error::Result;
use crate::ocr::{ImagePreprocessor, OcrEngine, ReadMode, TextCleaner, load_image};
use crate::outcome::{
    ExtractionOutcome, NO_TEXT_DETECTED, NO_TEXT_FOUND, OCR_PROVENANCE_SUFFIX, PAGE_BREAK,
    text_yield,
};
use crate::pdf::{DocumentOpener, PageRange, PageRasterizer, PdfOpener, pages_to_process};

use super::pipeline::OcrPipeline;
use super::progress::ProgressSink;

/// Extracts text from PDFs and images.
///
/// Owns the OCR engine, so the (expensive) reader is loaded at most once per
/// extractor. Like the engine, an extractor must not be used from several
/// threads at once.
pub struct TextExtractor {
    config: PdfOcrConfig,
    opener: Box<dyn DocumentOpener>,
    engine: OcrEngine,
    preprocessor: ImagePreprocessor,
    cleaner: TextCleaner,
}

impl TextExtractor {
    /// Extractor over lopdf documents with readers built from `config`.
    pub fn new(config: PdfOcrConfig) -> Self {
        let opener = Box::new(PdfOpener::new(PageRasterizer::new(
            config.pdf.render_command.clone(),
        )));
        let engine = OcrEngine::from_config(&config.ocr, &config.models);
        Self::with_parts(config, opener, engine)
    }

    /// Extractor with an explicit document opener and engine.
    pub fn with_parts(
        config: PdfOcrConfig,
        opener: Box<dyn DocumentOpener>,
        engine: OcrEngine,
    ) -> Self {
        Self {
            preprocessor: ImagePreprocessor::new(config.preprocess.clone()),
            cleaner: TextCleaner::new(),
            config,
            opener,
            engine,
        }
    }

    fn pipeline(&self) -> OcrPipeline<'_> {
        OcrPipeline {
            opener: self.opener.as_ref(),
            engine: &self.engine,
            preprocessor: &self.preprocessor,
            cleaner: &self.cleaner,
            config: &self.config,
        }
    }

    /// Extract the text of a PDF.
    ///
    /// Uses the text layer when it yields at least `min_text_length`
    /// characters. Otherwise, for whole-document requests, a layout-based
    /// extractor is tried, and if the text is still short the pages are
    /// OCRed. OCR text replaces native text only when it is strictly longer,
    /// and is marked with [`OCR_PROVENANCE_SUFFIX`].
    pub fn extract_text(
        &self,
        path: &Path,
        range: Option<PageRange>,
        progress: Option<&dyn ProgressSink>,
    ) -> ExtractionOutcome {
        let text = match self.native_text(path, range) {
            Ok(text) => text,
            Err(e) => return ExtractionOutcome::failed(format!("Text extraction failed: {}", e)),
        };

        let native_yield = text_yield(&text);
        if native_yield < self.config.pdf.min_text_length {
            info!(
                "Only {} characters in the text layer of {}, running OCR",
                native_yield,
                path.display()
            );

            match self.pipeline().run_raw(path, range, progress) {
                Ok(ocr_text) if text_yield(&ocr_text) > native_yield => {
                    info!("OCR recovered {} characters", text_yield(&ocr_text));
                    return ExtractionOutcome::ok(ocr_text + OCR_PROVENANCE_SUFFIX);
                }
                Ok(_) => debug!("OCR did not improve on the text layer"),
                Err(e) => warn!("OCR extraction failed: {}", e),
            }
        }

        if text.trim().is_empty() {
            return ExtractionOutcome::ok(NO_TEXT_FOUND);
        }
        ExtractionOutcome::ok(text)
    }

    /// Text layer of the requested pages, with the layout-based fallback for
    /// whole-document requests.
    fn native_text(&self, path: &Path, range: Option<PageRange>) -> Result<String> {
        let document = self.opener.open(path)?;

        let mut parts = Vec::new();
        for page in pages_to_process(range, document.page_count()) {
            let page_text = document.page_text(page)?;
            if !page_text.trim().is_empty() {
                parts.push(page_text);
            }
        }
        let text = parts.join(PAGE_BREAK);

        if range.is_none() && text_yield(&text) < self.config.pdf.min_text_length {
            match document.layout_text() {
                Ok(layout) if text_yield(&layout) > text_yield(&text) => {
                    debug!("Layout extraction found more text ({} chars)", text_yield(&layout));
                    return Ok(layout);
                }
                Ok(_) => {}
                Err(e) => debug!("Layout extraction failed: {}", e),
            }
        }

        Ok(text)
    }

    /// OCR every page of a PDF in `range`, ignoring its text layer.
    pub fn extract_text_with_ocr(
        &self,
        path: &Path,
        range: Option<PageRange>,
        progress: Option<&dyn ProgressSink>,
    ) -> ExtractionOutcome {
        self.pipeline().run(path, range, progress)
    }

    /// OCR a standalone image after contrast and sharpness enhancement.
    pub fn extract_text_from_image(&self, path: &Path) -> ExtractionOutcome {
        if !path.exists() {
            return ExtractionOutcome::failed("Image file not found.");
        }

        match self.read_image(path) {
            Ok(text) if text.trim().is_empty() => ExtractionOutcome::ok(NO_TEXT_DETECTED),
            Ok(text) => ExtractionOutcome::ok(text),
            Err(e) => ExtractionOutcome::failed(e.to_string()),
        }
    }

    fn read_image(&self, path: &Path) -> Result<String> {
        let image = load_image(path)?;
        let enhanced = DynamicImage::ImageLuma8(self.preprocessor.enhance(&image));
        let result = self.engine.read_text(&enhanced, ReadMode::Paragraphs)?;
        Ok(result.text)
    }
}

//! Core library for PDF and image text extraction.
//!
//! This crate provides:
//! - PDF access (text layer, embedded images, page rasterization, metadata)
//! - Image preprocessing for OCR (denoise, binarize, deskew)
//! - A two-backend OCR engine (neural models, Tesseract fallback)
//! - Native-first text extraction with automatic OCR escalation

pub mod config;
pub mod error;
pub mod extract;
pub mod ocr;
pub mod outcome;
pub mod pdf;

#[cfg(test)]
mod testutil;

pub use config::PdfOcrConfig;
pub use error::{OcrError, PdfError, PdfOcrError, Result};
pub use extract::{ProgressEvent, ProgressSink, TextExtractor};
pub use ocr::{Backend, OcrEngine, OcrResult, ReadMode, TextBox, TextReader};
pub use outcome::{ExtractionOutcome, StepOutcome};
pub use pdf::{DocumentInfo, PageRange, PdfExtractor, PdfProcessor, SearchMatch};

//! Text extraction: native text layer first, OCR when it comes up short.

mod extractor;
mod pipeline;
mod progress;

pub use extractor::TextExtractor;
pub use progress::{ProgressEvent, ProgressSink};

pub use crate::outcome::{
    ExtractionOutcome, NO_OCR_TEXT, NO_TEXT_DETECTED, NO_TEXT_FOUND, OCR_PROVENANCE_SUFFIX,
    PAGE_BREAK, StepOutcome,
};

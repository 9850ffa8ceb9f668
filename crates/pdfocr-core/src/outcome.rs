//! Result shapes shared by the pipeline stages.

use serde::{Deserialize, Serialize};

/// Separator between the texts of consecutive pages.
pub const PAGE_BREAK: &str = "\n\n--- Page Break ---\n\n";

/// Appended to text that came from OCR rather than the PDF text layer.
pub const OCR_PROVENANCE_SUFFIX: &str = "\n\n[Text extracted using OCR]";

/// Neither native extraction nor OCR produced text.
pub const NO_TEXT_FOUND: &str = "[No text found in PDF - OCR also yielded no results]";

/// The OCR pipeline ran but produced no text.
pub const NO_OCR_TEXT: &str = "[No text could be extracted via OCR]";

/// Single-image OCR produced no text.
pub const NO_TEXT_DETECTED: &str = "[No text detected]";

/// Result of an internal step that degrades instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome<T> {
    /// The step did what it was asked to.
    Ok(T),
    /// The step could not run; `value` is the usable fallback (usually its input).
    Degraded { value: T, reason: String },
}

impl<T> StepOutcome<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, StepOutcome::Degraded { .. })
    }

    /// The produced or fallback value.
    pub fn value(self) -> T {
        match self {
            StepOutcome::Ok(value) | StepOutcome::Degraded { value, .. } => value,
        }
    }
}

/// What the public extraction operations return: never an error, always text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    pub success: bool,
    pub text: String,
}

impl ExtractionOutcome {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            text: message.into(),
        }
    }

    pub fn into_tuple(self) -> (bool, String) {
        (self.success, self.text)
    }

    /// Whether the text carries the OCR provenance suffix.
    pub fn is_ocr_derived(&self) -> bool {
        self.text.ends_with(OCR_PROVENANCE_SUFFIX)
    }

    /// Text without the OCR provenance suffix.
    pub fn without_provenance(&self) -> &str {
        self.text
            .strip_suffix(OCR_PROVENANCE_SUFFIX)
            .unwrap_or(&self.text)
    }

    /// Per-page texts, split on the page-break marker.
    pub fn pages(&self) -> Vec<&str> {
        self.without_provenance().split(PAGE_BREAK).collect()
    }
}

/// Number of characters in `text` once surrounding whitespace is removed.
pub fn text_yield(text: &str) -> usize {
    text.trim().chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_step_outcome_value() {
        assert_eq!(StepOutcome::Ok(1).value(), 1);
        let degraded = StepOutcome::Degraded {
            value: 2,
            reason: "x".into(),
        };
        assert!(degraded.is_degraded());
        assert_eq!(degraded.value(), 2);
    }

    #[test]
    fn test_provenance_and_pages() {
        let outcome = ExtractionOutcome::ok(format!("A{}B{}", PAGE_BREAK, OCR_PROVENANCE_SUFFIX));
        assert!(outcome.is_ocr_derived());
        assert_eq!(outcome.pages(), vec!["A", "B"]);
        assert!(outcome.clone().into_tuple().0);
        assert!(!ExtractionOutcome::ok("plain").is_ocr_derived());
    }

    #[test]
    fn test_text_yield_counts_chars() {
        assert_eq!(text_yield("  żółw \n"), 4);
        assert_eq!(text_yield(""), 0);
    }
}

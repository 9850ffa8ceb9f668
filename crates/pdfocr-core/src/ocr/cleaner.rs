//! Post-OCR correction of common misreads.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Applied in order, all case-insensitive.
    static ref CORRECTIONS: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)Mathematlcs").unwrap(), "Mathematics"),
        (Regex::new(r"(?i)\bI\b").unwrap(), "1"),
        (Regex::new(r"(?i)\bO\b").unwrap(), "0"),
        (Regex::new(r"(?i)filllng").unwrap(), "filling"),
        (Regex::new(r"(?i)followlng").unwrap(), "following"),
        (Regex::new(r"(?i)questlon").unwrap(), "question"),
    ];
}

/// Fixes known character-level OCR confusions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextCleaner;

impl TextCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Apply every correction to `text`. Cleaning clean text changes nothing.
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        CORRECTIONS
            .iter()
            .fold(text.to_string(), |acc, (pattern, replacement)| {
                pattern.replace_all(&acc, *replacement).into_owned()
            })
    }
}

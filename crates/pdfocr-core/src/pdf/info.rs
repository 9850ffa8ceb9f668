//! Document metadata and full-text search.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PdfExtractor, PdfProcessor, Result};

/// Characters of context kept on each side of a search hit.
const CONTEXT_CHARS: usize = 50;

/// Summary information about a PDF file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub pages: u32,
    pub encrypted: bool,
    pub size_bytes: u64,
    /// Size in MiB, rounded to two decimals.
    pub size_mb: f64,
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    /// `/Rotate` of each page, in degrees.
    pub rotations: Vec<i64>,
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Page number (1-indexed).
    pub page: u32,
    /// Character offset of the hit within the page text.
    pub position: usize,
    /// Surrounding text, trimmed.
    pub context: String,
}

/// Read page count, encryption state, size and metadata of a PDF.
pub fn document_info(path: &Path) -> Result<DocumentInfo> {
    let size_bytes = std::fs::metadata(path)?.len();
    let extractor = PdfExtractor::open(path)?;

    let field = |key: &str| {
        extractor
            .metadata(key)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    };

    let pages = extractor.page_count();
    let rotations = (0..pages)
        .map(|page| extractor.rotation(page).unwrap_or(0))
        .collect();

    Ok(DocumentInfo {
        pages,
        encrypted: extractor.is_encrypted(),
        size_bytes,
        size_mb: (size_bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
        title: field("Title"),
        author: field("Author"),
        subject: field("Subject"),
        creator: field("Creator"),
        rotations,
    })
}

/// Find every occurrence of `query` in the text layer of a PDF.
pub fn search(path: &Path, query: &str, case_sensitive: bool) -> Result<Vec<SearchMatch>> {
    let extractor = PdfExtractor::open(path)?;
    let mut matches = Vec::new();

    for page in 0..extractor.page_count() {
        let text = extractor.page_text(page).unwrap_or_default();
        matches.extend(search_text(&text, query, case_sensitive, page + 1));
    }

    debug!("Found {} matches for '{}' in {}", matches.len(), query, path.display());
    Ok(matches)
}

/// Overlapping substring search over one page of text.
fn search_text(text: &str, query: &str, case_sensitive: bool, page: u32) -> Vec<SearchMatch> {
    let fold = |c: char| {
        if case_sensitive {
            c
        } else {
            c.to_lowercase().next().unwrap_or(c)
        }
    };

    let original: Vec<char> = text.chars().collect();
    let haystack: Vec<char> = original.iter().map(|&c| fold(c)).collect();
    let needle: Vec<char> = query.chars().map(fold).collect();

    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }

    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle.as_slice())
        .map(|(pos, _)| {
            let start = pos.saturating_sub(CONTEXT_CHARS);
            let end = (pos + needle.len() + CONTEXT_CHARS).min(original.len());
            let context: String = original[start..end].iter().collect();
            SearchMatch {
                page,
                position: pos,
                context: context.trim().to_string(),
            }
        })
        .collect()
}

//! PDF document access.
//!
//! The extraction pipeline only talks to documents through [`PdfProcessor`],
//! obtained from a [`DocumentOpener`]. Pages are zero-indexed everywhere in
//! this module; dropping the processor closes the document.

mod extractor;
pub mod info;
mod render;

pub use extractor::{PdfExtractor, PdfOpener};
pub use info::{DocumentInfo, SearchMatch};
pub use render::PageRasterizer;

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text layer of a single page (fast per-page extractor).
    fn page_text(&self, page: u32) -> Result<String>;

    /// Extract the text of the whole document with the layout-analysis extractor.
    fn layout_text(&self) -> Result<String>;

    /// List the embedded raster images of a page, in resource order.
    fn page_images(&self, page: u32) -> Result<Vec<ImageRef>>;

    /// Pull the bytes of an embedded image.
    fn extract_image(&self, image: &ImageRef) -> Result<ExtractedImage>;

    /// Rasterize a page to a PNG at `dest` and return the written path.
    fn render_page(&self, page: u32, dpi: u32, dest: &Path) -> Result<PathBuf>;

    /// Page rotation in degrees (`/Rotate`, inherited through the page tree).
    fn rotation(&self, page: u32) -> Result<i64>;
}

/// Opens documents for the extraction pipeline.
pub trait DocumentOpener {
    /// Open the document at `path`.
    fn open(&self, path: &Path) -> Result<Box<dyn PdfProcessor>>;
}

/// Reference to an embedded image XObject on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Object id of the image stream.
    pub object_id: (u32, u16),
    /// Resource name on the page (e.g. `Im0`).
    pub name: String,
}

/// An image pulled out of a PDF or rendered from a page.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// Encoded image data.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Image format / file extension (`jpg`, `png`).
    pub format: String,
}

/// Zero-based, half-open page range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl PageRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Pages of this range that exist in a document with `page_count` pages.
    pub fn clamp(&self, page_count: u32) -> Range<u32> {
        let end = self.end.min(page_count);
        self.start.min(end)..end
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

impl FromStr for PageRange {
    type Err = String;

    /// Parse `START:END` (zero-based, end exclusive).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| format!("expected START:END, got '{}'", s))?;
        let start = start
            .trim()
            .parse()
            .map_err(|_| format!("invalid start page '{}'", start))?;
        let end = end
            .trim()
            .parse()
            .map_err(|_| format!("invalid end page '{}'", end))?;
        Ok(Self { start, end })
    }
}

/// Pages to visit for an optional range.
pub fn pages_to_process(range: Option<PageRange>, page_count: u32) -> Range<u32> {
    match range {
        Some(range) => range.clamp(page_count),
        None => 0..page_count,
    }
}

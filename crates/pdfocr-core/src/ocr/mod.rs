//! OCR: preprocessing, the text readers and the engine that picks between them.

mod cleaner;
mod engine;
pub mod filters;
pub mod geometry;
#[cfg(feature = "native")]
mod neural;
mod preprocessing;
mod tesseract;

pub use cleaner::TextCleaner;
pub use engine::{OcrEngine, ReaderLoader};
#[cfg(feature = "native")]
pub use neural::NeuralReader;
pub use preprocessing::{ImagePreprocessor, load_image};
pub use tesseract::TesseractReader;

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Height of the bands used to bucket boxes into rows, in pixels.
const ROW_BAND: f32 = 20.0;

/// The OCR backends an engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Backend {
    /// ONNX detection + recognition models.
    Neural,
    /// The external `tesseract` executable.
    Tesseract,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Neural => write!(f, "neural"),
            Backend::Tesseract => write!(f, "tesseract"),
        }
    }
}

/// How recognized text is grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// One fragment per detected line.
    Lines,
    /// Nearby lines merged into paragraphs.
    Paragraphs,
}

/// A text recognizer.
pub trait TextReader {
    /// Which backend this reader is.
    fn backend(&self) -> Backend;

    /// Recognize the text in `image`.
    fn read(&self, image: &DynamicImage, mode: ReadMode) -> Result<OcrResult, OcrError>;
}

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,
}

impl TextBox {
    /// Axis-aligned box, mostly for tests and synthetic input.
    pub fn from_rect(x0: f32, y0: f32, x1: f32, y1: f32, text: impl Into<String>) -> Self {
        Self {
            bbox: [x0, y0, x1, y0, x1, y1, x0, y1],
            text: text.into(),
            confidence: 1.0,
        }
    }

    /// Get the height of the bounding box.
    pub fn height(&self) -> f32 {
        let dx1 = self.bbox[6] - self.bbox[0];
        let dy1 = self.bbox[7] - self.bbox[1];
        (dx1 * dx1 + dy1 * dy1).sqrt()
    }

    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResult {
    /// Detected and recognized text boxes, in reading order.
    pub boxes: Vec<TextBox>,

    /// Text fragments (lines or paragraphs, depending on the read mode).
    pub fragments: Vec<String>,

    /// Full text.
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Build a result from recognized boxes.
    ///
    /// Boxes are put in reading order (20px row bands, then left to right).
    /// In paragraph mode a box joins the current paragraph when its top is
    /// within `gap_ratio` line heights of the paragraph's bottom and it
    /// overlaps the paragraph horizontally.
    pub fn from_boxes(
        mut boxes: Vec<TextBox>,
        mode: ReadMode,
        gap_ratio: f32,
        image_size: (u32, u32),
    ) -> Self {
        boxes.retain(|b| !b.text.trim().is_empty());
        sort_by_reading_order(&mut boxes);

        let (fragments, separator) = match mode {
            ReadMode::Lines => (
                boxes.iter().map(|b| b.text.trim().to_string()).collect(),
                "\n",
            ),
            ReadMode::Paragraphs => (group_paragraphs(&boxes, gap_ratio), "\n\n"),
        };

        Self {
            text: fragments.join(separator),
            boxes,
            fragments,
            processing_time_ms: 0,
            image_size,
        }
    }

    /// Build a result from plain recognized text (no box geometry).
    pub fn from_text(text: &str, image_size: (u32, u32)) -> Self {
        let fragments = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            boxes: Vec::new(),
            fragments,
            text: text.trim().to_string(),
            processing_time_ms: 0,
            image_size,
        }
    }

    pub fn with_elapsed(mut self, processing_time_ms: u64) -> Self {
        self.processing_time_ms = processing_time_ms;
        self
    }

    /// Whether no text was recognized.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Sort boxes by reading order (top-to-bottom, left-to-right).
pub fn sort_by_reading_order(boxes: &mut [TextBox]) {
    boxes.sort_by(|a, b| {
        let (ax, ay, _, _) = a.rect();
        let (bx, by, _, _) = b.rect();

        // Group by approximate vertical position
        let row_a = (ay / ROW_BAND) as i32;
        let row_b = (by / ROW_BAND) as i32;

        if row_a != row_b {
            row_a.cmp(&row_b)
        } else {
            ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal)
        }
    });
}

struct Paragraph {
    text: String,
    min_x: f32,
    max_x: f32,
    max_y: f32,
}

fn group_paragraphs(boxes: &[TextBox], gap_ratio: f32) -> Vec<String> {
    let mut paragraphs: Vec<Paragraph> = Vec::new();

    for b in boxes {
        let (min_x, min_y, max_x, max_y) = b.rect();
        let line_height = b.height().max(max_y - min_y).max(1.0);
        let text = b.text.trim();

        match paragraphs.last_mut() {
            Some(p)
                if min_y - p.max_y <= gap_ratio * line_height
                    && min_x <= p.max_x + line_height
                    && max_x >= p.min_x - line_height =>
            {
                p.text.push(' ');
                p.text.push_str(text);
                p.min_x = p.min_x.min(min_x);
                p.max_x = p.max_x.max(max_x);
                p.max_y = p.max_y.max(max_y);
            }
            _ => paragraphs.push(Paragraph {
                text: text.to_string(),
                min_x,
                max_x,
                max_y,
            }),
        }
    }

    paragraphs.into_iter().map(|p| p.text).collect()
}

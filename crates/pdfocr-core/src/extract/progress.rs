//! Progress reporting for long-running extractions.

use std::fmt;

/// A step of the OCR pipeline, rendered as a human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// The OCR engine is being selected (and its models possibly loaded).
    LoadingModel,
    /// Starting page `current` (1-based position within the processed range).
    Page { current: u32, total: u32 },
    /// Starting image `image` of a page holding several images.
    Image {
        page: u32,
        total_pages: u32,
        image: u32,
        total_images: u32,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressEvent::LoadingModel => write!(f, "Loading OCR Model... (This may take time)..."),
            ProgressEvent::Page { current, total } => {
                write!(f, "Processing Page {} of {}...", current, total)
            }
            ProgressEvent::Image {
                page,
                total_pages,
                image,
                total_images,
            } => write!(
                f,
                "Processing Page {}/{} (Image {}/{})...",
                page, total_pages, image, total_images
            ),
        }
    }
}

/// Receives progress events.
pub trait ProgressSink {
    fn report(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent),
{
    fn report(&self, event: &ProgressEvent) {
        self(event)
    }
}

pub(crate) fn report(sink: Option<&dyn ProgressSink>, event: ProgressEvent) {
    if let Some(sink) = sink {
        sink.report(&event);
    }
}

//! Image preprocessing for OCR.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageReader};
use tracing::{debug, warn};

use crate::config::PreprocessConfig;
use crate::error::OcrError;
use crate::outcome::StepOutcome;

use super::filters;
use super::geometry::{self, Point};

/// Turns raw page images into OCR-friendly bitmaps.
///
/// Every operation degrades to its input on failure; none of them returns an
/// error.
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Grayscale, optionally denoise, binarize and optionally deskew the image
    /// at `path`, writing `<stem>_processed<ext>` next to it.
    ///
    /// On any failure the original path is returned as `Degraded`.
    pub fn preprocess(&self, path: &Path) -> StepOutcome<PathBuf> {
        match self.try_preprocess(path) {
            Ok(output) => StepOutcome::Ok(output),
            Err(e) => {
                warn!("Preprocessing failed for {}: {}", path.display(), e);
                StepOutcome::Degraded {
                    value: path.to_path_buf(),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn try_preprocess(&self, path: &Path) -> Result<PathBuf, OcrError> {
        let gray = load_image(path)?.to_luma8();
        if gray.width() == 0 || gray.height() == 0 {
            return Err(OcrError::InvalidImage("empty image".to_string()));
        }

        let gray = if self.config.denoise {
            let denoised = filters::nl_means_denoise(
                &gray,
                self.config.denoise_strength,
                self.config.template_window,
                self.config.search_window,
            );
            filters::gaussian_blur_5x5(&denoised)
        } else {
            gray
        };

        let binary = filters::otsu_binarize(&gray);

        let result = if self.config.deskew {
            self.deskew(&binary).value()
        } else {
            binary
        };

        let output = processed_path(path)?;
        result
            .save(&output)
            .map_err(|e| OcrError::Preprocessing(format!("failed to write {}: {}", output.display(), e)))?;

        debug!("Preprocessed {} -> {}", path.display(), output.display());
        Ok(output)
    }

    /// Estimate the skew of the foreground and rotate it level.
    pub fn deskew(&self, image: &GrayImage) -> StepOutcome<GrayImage> {
        let points = foreground_points(image);
        if points.len() < 3 {
            return StepOutcome::Degraded {
                value: image.clone(),
                reason: "not enough foreground pixels to estimate skew".to_string(),
            };
        }

        let Some(rect) = geometry::min_area_rect(&points) else {
            return StepOutcome::Degraded {
                value: image.clone(),
                reason: "no enclosing rectangle".to_string(),
            };
        };

        let correction = geometry::deskew_correction(rect.angle);
        debug!("Skew angle {:.2}, rotating by {:.2}", rect.angle, correction);

        if correction == 0.0 {
            return StepOutcome::Ok(image.clone());
        }
        StepOutcome::Ok(filters::rotate_about_center(image, correction as f32))
    }

    /// Lighter enhancement for standalone images: grayscale, then contrast and
    /// sharpness boosts.
    pub fn enhance(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        let contrasted = filters::adjust_contrast(&gray, self.config.contrast);
        filters::adjust_sharpness(&contrasted, self.config.sharpness)
    }
}

/// Decode an image, sniffing the format from content rather than extension.
pub fn load_image(path: &Path) -> Result<DynamicImage, OcrError> {
    ImageReader::open(path)
        .map_err(|e| OcrError::InvalidImage(format!("{}: {}", path.display(), e)))?
        .with_guessed_format()
        .map_err(|e| OcrError::InvalidImage(format!("{}: {}", path.display(), e)))?
        .decode()
        .map_err(|e| OcrError::InvalidImage(format!("{}: {}", path.display(), e)))
}

fn processed_path(path: &Path) -> Result<PathBuf, OcrError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| OcrError::Preprocessing(format!("no file name: {}", path.display())))?;
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_processed.{}", stem, ext),
        None => format!("{}_processed", stem),
    };
    Ok(path.with_file_name(name))
}

/// Leftmost and rightmost non-zero pixel of every row, as `(row, column)`.
///
/// Interior pixels of a row never lie on the convex hull, so the extremes are
/// enough for the enclosing rectangle. The `(row, column)` order is what gives
/// [`geometry::deskew_correction`] its sign convention.
fn foreground_points(image: &GrayImage) -> Vec<Point> {
    let mut points = Vec::new();
    for (y, row) in image.rows().enumerate() {
        let mut first = None;
        let mut last = None;
        for (x, pixel) in row.enumerate() {
            if pixel[0] > 0 {
                first.get_or_insert(x);
                last = Some(x);
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            points.push(Point::new(y as f64, first as f64));
            if last != first {
                points.push(Point::new(y as f64, last as f64));
            }
        }
    }
    points
}

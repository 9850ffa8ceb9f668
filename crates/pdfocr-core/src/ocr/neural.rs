//! Primary reader backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::config::{ModelConfig, OcrConfig};
use crate::error::OcrError;

use super::{Backend, OcrResult, ReadMode, TextBox, TextReader};

/// Detection + recognition models run in-process.
pub struct NeuralReader {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
    paragraph_gap_ratio: f32,
}

impl NeuralReader {
    /// Load the models named in `models`.
    pub fn load(models: &ModelConfig, config: &OcrConfig) -> Result<Self, OcrError> {
        let missing = models.missing_files();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
            return Err(OcrError::ModelLoad(format!(
                "missing model files: {}",
                names.join(", ")
            )));
        }

        let (det_path, rec_path, dict_path) = models.paths();
        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded OCR models from {}", models.model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
            paragraph_gap_ratio: config.paragraph_gap_ratio,
        })
    }
}

impl TextReader for NeuralReader {
    fn backend(&self) -> Backend {
        Backend::Neural
    }

    fn read(&self, image: &DynamicImage, mode: ReadMode) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        debug!("Running neural OCR on {}x{} image", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let boxes: Vec<TextBox> = results
            .iter()
            .map(|r| TextBox {
                bbox: polygon_to_bbox(&r.bounding_box),
                text: if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
                confidence: r.confidence,
            })
            .collect();

        let result = OcrResult::from_boxes(boxes, mode, self.paragraph_gap_ratio, (width, height))
            .with_elapsed(start.elapsed().as_millis() as u64);

        debug!(
            "Neural OCR: {} boxes, {} fragments in {}ms",
            result.boxes.len(),
            result.fragments.len(),
            result.processing_time_ms
        );

        Ok(result)
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
///
/// Extracts the first 4 exterior points (quadrilateral) as
/// `[x1, y1, x2, y2, x3, y3, x4, y4]`.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}

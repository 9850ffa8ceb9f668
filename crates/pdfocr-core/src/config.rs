//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for pdfocr.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfOcrConfig {
    /// OCR engine configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Image preprocessing configuration.
    pub preprocess: PreprocessConfig,

    /// Model configuration.
    pub models: ModelConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Try the neural reader before falling back to Tesseract.
    pub prefer_neural: bool,

    /// Tesseract executable name or path.
    pub tesseract_command: String,

    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub language: String,

    /// Keep `[UNK]` tokens produced by the neural recognizer.
    pub keep_unk: bool,

    /// Maximum vertical gap between two lines of the same paragraph,
    /// as a multiple of the line height.
    pub paragraph_gap_ratio: f32,

    /// Parent directory for per-run temp directories and Tesseract scratch
    /// images (system temp dir if unset).
    pub temp_root: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            prefer_neural: true,
            tesseract_command: "tesseract".to_string(),
            language: "eng".to_string(),
            keep_unk: false,
            paragraph_gap_ratio: 1.0,
            temp_root: None,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rasterizing pages that have no embedded images.
    pub render_dpi: u32,

    /// Minimum trimmed text length (chars) for native extraction to count as a success.
    pub min_text_length: usize,

    /// Executable used to rasterize pages.
    pub render_command: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 200,
            min_text_length: 100,
            render_command: "pdftoppm".to_string(),
        }
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Estimate and correct page skew.
    pub deskew: bool,

    /// Run non-local-means denoising followed by a Gaussian blur.
    pub denoise: bool,

    /// Non-local-means filter strength (`h`).
    pub denoise_strength: f32,

    /// Non-local-means patch size (odd).
    pub template_window: u32,

    /// Non-local-means search window size (odd).
    pub search_window: u32,

    /// Contrast factor for single-image enhancement.
    pub contrast: f32,

    /// Sharpness factor for single-image enhancement.
    pub sharpness: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            deskew: true,
            denoise: true,
            denoise_strength: 10.0,
            template_window: 7,
            search_window: 21,
            contrast: 2.0,
            sharpness: 2.0,
        }
    }
}

/// Model file locations for the neural reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Full paths of (detection, recognition, dictionary).
    pub fn paths(&self) -> (PathBuf, PathBuf, PathBuf) {
        (
            self.model_dir.join(&self.detection_model),
            self.model_dir.join(&self.recognition_model),
            self.model_dir.join(&self.dictionary),
        )
    }

    /// Names of the model files missing from `model_dir`.
    pub fn missing_files(&self) -> Vec<PathBuf> {
        let (det, rec, dict) = self.paths();
        [det, rec, dict].into_iter().filter(|p| !p.exists()).collect()
    }
}

impl PdfOcrConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

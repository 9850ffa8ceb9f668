//! The engine handle: lazy primary reader with a permanent fallback.

use std::cell::OnceCell;

use image::DynamicImage;
use tracing::{info, warn};

use crate::config::{ModelConfig, OcrConfig};
use crate::error::OcrError;

use super::{Backend, OcrResult, ReadMode, TesseractReader, TextReader};

/// Builds the primary reader on first use.
pub type ReaderLoader = Box<dyn Fn() -> Result<Box<dyn TextReader>, OcrError>>;

enum ActiveReader {
    Primary(Box<dyn TextReader>),
    Fallback { reason: String },
}

/// Owns the OCR readers for one caller.
///
/// The primary reader is loaded at most once, on first use. If loading fails
/// the fallback reader is used for the rest of the engine's life. The engine
/// is `!Sync`: callers sharing it across threads must serialise access.
pub struct OcrEngine {
    loader: Option<ReaderLoader>,
    fallback: Box<dyn TextReader>,
    active: OnceCell<ActiveReader>,
}

impl OcrEngine {
    /// `loader` builds the primary reader (`None` disables it), `fallback` is
    /// used whenever the primary is unavailable.
    pub fn new(loader: Option<ReaderLoader>, fallback: Box<dyn TextReader>) -> Self {
        Self {
            loader,
            fallback,
            active: OnceCell::new(),
        }
    }

    /// Neural reader from `models` (when `prefer_neural`), Tesseract fallback.
    pub fn from_config(ocr: &OcrConfig, models: &ModelConfig) -> Self {
        let fallback = Box::new(
            TesseractReader::new(ocr.tesseract_command.clone(), ocr.language.clone())
                .with_temp_root(ocr.temp_root.clone()),
        );
        let loader = ocr
            .prefer_neural
            .then(|| neural_loader(ocr.clone(), models.clone()));
        Self::new(loader, fallback)
    }

    fn select(&self) -> &ActiveReader {
        self.active.get_or_init(|| {
            let Some(load) = &self.loader else {
                info!("Neural OCR disabled, using {}", self.fallback.backend());
                return ActiveReader::Fallback {
                    reason: "primary reader disabled".to_string(),
                };
            };

            match load() {
                Ok(reader) => {
                    info!("OCR engine ready ({})", reader.backend());
                    ActiveReader::Primary(reader)
                }
                Err(e) => {
                    warn!(
                        "Primary OCR reader unavailable ({}), falling back to {}",
                        e,
                        self.fallback.backend()
                    );
                    ActiveReader::Fallback {
                        reason: e.to_string(),
                    }
                }
            }
        })
    }

    /// Load the readers if that has not happened yet.
    pub fn ensure_loaded(&self) {
        self.select();
    }

    /// Whether reader selection has already happened.
    pub fn is_loaded(&self) -> bool {
        self.active.get().is_some()
    }

    /// The backend serving requests (selecting it if needed).
    pub fn active_backend(&self) -> Backend {
        match self.select() {
            ActiveReader::Primary(reader) => reader.backend(),
            ActiveReader::Fallback { .. } => self.fallback.backend(),
        }
    }

    /// Why the fallback is in use, if it is.
    pub fn fallback_reason(&self) -> Option<&str> {
        match self.select() {
            ActiveReader::Primary(_) => None,
            ActiveReader::Fallback { reason } => Some(reason),
        }
    }

    /// Recognize the text of `image` with the active reader.
    pub fn read_text(&self, image: &DynamicImage, mode: ReadMode) -> Result<OcrResult, OcrError> {
        match self.select() {
            ActiveReader::Primary(reader) => reader.read(image, mode),
            ActiveReader::Fallback { .. } => self.fallback.read(image, mode),
        }
    }
}

#[cfg(feature = "native")]
fn neural_loader(ocr: OcrConfig, models: ModelConfig) -> ReaderLoader {
    Box::new(move || {
        let reader = super::NeuralReader::load(&models, &ocr)?;
        Ok(Box::new(reader) as Box<dyn TextReader>)
    })
}

#[cfg(not(feature = "native"))]
fn neural_loader(_ocr: OcrConfig, _models: ModelConfig) -> ReaderLoader {
    Box::new(|| {
        Err(OcrError::ModelLoad(
            "built without the `native` feature".to_string(),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockReader;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_loader(calls: Rc<Cell<usize>>, succeed: bool) -> ReaderLoader {
        Box::new(move || {
            calls.set(calls.get() + 1);
            if succeed {
                Ok(Box::new(MockReader::new(Backend::Neural, "neural text")) as Box<dyn TextReader>)
            } else {
                Err(OcrError::ModelLoad("no models".to_string()))
            }
        })
    }

    #[test]
    fn test_loads_primary_once() {
        let calls = Rc::new(Cell::new(0));
        let engine = OcrEngine::new(
            Some(counting_loader(calls.clone(), true)),
            Box::new(MockReader::new(Backend::Tesseract, "fallback text")),
        );

        assert!(!engine.is_loaded());
        let image = DynamicImage::new_luma8(2, 2);
        let first = engine.read_text(&image, ReadMode::Lines).unwrap();
        engine.read_text(&image, ReadMode::Lines).unwrap();

        assert_eq!(first.text, "neural text");
        assert_eq!(engine.active_backend(), Backend::Neural);
        assert_eq!(engine.fallback_reason(), None);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_failed_load_falls_back_permanently() {
        let calls = Rc::new(Cell::new(0));
        let engine = OcrEngine::new(
            Some(counting_loader(calls.clone(), false)),
            Box::new(MockReader::new(Backend::Tesseract, "fallback text")),
        );

        let image = DynamicImage::new_luma8(2, 2);
        for _ in 0..3 {
            let result = engine.read_text(&image, ReadMode::Paragraphs).unwrap();
            assert_eq!(result.text, "fallback text");
        }

        assert_eq!(calls.get(), 1);
        assert_eq!(engine.active_backend(), Backend::Tesseract);
        assert!(engine.fallback_reason().unwrap().contains("no models"));
    }

    #[test]
    fn test_disabled_primary_uses_fallback() {
        let ocr = OcrConfig {
            prefer_neural: false,
            ..OcrConfig::default()
        };
        let engine = OcrEngine::from_config(&ocr, &ModelConfig::default());
        assert_eq!(engine.active_backend(), Backend::Tesseract);
        assert!(engine.is_loaded());
    }

    #[test]
    fn test_missing_models_fall_back_to_tesseract() {
        let dir = tempfile::tempdir().unwrap();
        let models = ModelConfig {
            model_dir: dir.path().to_path_buf(),
            ..ModelConfig::default()
        };
        let engine = OcrEngine::from_config(&OcrConfig::default(), &models);
        engine.ensure_loaded();
        assert_eq!(engine.active_backend(), Backend::Tesseract);
    }
}

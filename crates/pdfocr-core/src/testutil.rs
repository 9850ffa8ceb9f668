//! Fixtures shared by the unit tests: small generated PDFs and mock
//! document/reader implementations that count how they are used.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, Luma};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::{OcrError, PdfError};
use crate::ocr::{Backend, OcrResult, ReadMode, TextReader};
use crate::pdf::{DocumentOpener, ExtractedImage, ImageRef, PdfProcessor, Result};

/// Write a PDF with one page per entry of `pages`, each showing that text.
pub fn write_text_pdf(dir: &Path, pages: &[&str]) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Sample"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let path = dir.join("text.pdf");
    doc.save(&path).unwrap();
    path
}

/// Write a one-page PDF without a text layer whose page shows a single
/// 2x2 8-bit gray image `Im0` (pixels 0, 255 / 255, 0). The page tree root
/// carries `/Rotate 90`.
pub fn write_image_pdf(dir: &Path) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0, 255, 255, 0],
    ));
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![200.into(), 0.into(), 0.into(), 200.into(), 100.into(), 400.into()],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im0" => image_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Rotate" => 90,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join("scan.pdf");
    doc.save(&path).unwrap();
    path
}

/// PNG bytes of a small white image.
pub fn blank_png() -> Vec<u8> {
    let image = GrayImage::from_pixel(8, 8, Luma([255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Counters observed by the mocks.
#[derive(Debug, Default)]
pub struct Spy {
    pub opened: Cell<usize>,
    pub closed: Cell<usize>,
    pub layout_calls: Cell<usize>,
    pub page_text_calls: Cell<usize>,
    pub renders: Cell<usize>,
}

fn bump(cell: &Cell<usize>) {
    cell.set(cell.get() + 1);
}

/// One page of a [`MockPdf`].
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    pub text: String,
    /// Number of embedded images.
    pub images: usize,
    /// Index of an image whose extraction fails.
    pub broken_image: Option<usize>,
    pub render_fails: bool,
}

impl MockPage {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn scanned(images: usize) -> Self {
        Self {
            images,
            ..Self::default()
        }
    }
}

/// In-memory document description.
#[derive(Debug, Clone, Default)]
pub struct MockPdf {
    pub pages: Vec<MockPage>,
    /// Whole-document layout text; `None` makes the call fail.
    pub layout_text: Option<String>,
    pub spy: Rc<Spy>,
}

impl MockPdf {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn with_layout_text(mut self, text: &str) -> Self {
        self.layout_text = Some(text.to_string());
        self
    }
}

struct MockDocument {
    pdf: MockPdf,
}

impl Drop for MockDocument {
    fn drop(&mut self) {
        bump(&self.pdf.spy.closed);
    }
}

impl MockDocument {
    fn page(&self, page: u32) -> Result<&MockPage> {
        self.pdf
            .pages
            .get(page as usize)
            .ok_or(PdfError::InvalidPage(page))
    }
}

impl PdfProcessor for MockDocument {
    fn page_count(&self) -> u32 {
        self.pdf.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        bump(&self.pdf.spy.page_text_calls);
        Ok(self.page(page)?.text.clone())
    }

    fn layout_text(&self) -> Result<String> {
        bump(&self.pdf.spy.layout_calls);
        self.pdf
            .layout_text
            .clone()
            .ok_or_else(|| PdfError::TextExtraction("no layout text".to_string()))
    }

    fn page_images(&self, page: u32) -> Result<Vec<ImageRef>> {
        let count = self.page(page)?.images;
        Ok((0..count)
            .map(|i| ImageRef {
                object_id: (page * 100 + i as u32, 0),
                name: format!("Im{}", i),
            })
            .collect())
    }

    fn extract_image(&self, image: &ImageRef) -> Result<ExtractedImage> {
        let page = image.object_id.0 / 100;
        let index = (image.object_id.0 % 100) as usize;
        if self.page(page)?.broken_image == Some(index) {
            return Err(PdfError::ImageExtraction("corrupt stream".to_string()));
        }
        Ok(ExtractedImage {
            data: blank_png(),
            width: 8,
            height: 8,
            format: "png".to_string(),
        })
    }

    fn render_page(&self, page: u32, _dpi: u32, dest: &Path) -> Result<PathBuf> {
        bump(&self.pdf.spy.renders);
        if self.page(page)?.render_fails {
            return Err(PdfError::Render("pdftoppm not found".to_string()));
        }
        std::fs::write(dest, blank_png())?;
        Ok(dest.to_path_buf())
    }

    fn rotation(&self, _page: u32) -> Result<i64> {
        Ok(0)
    }
}

/// Opens a fixed [`MockPdf`] regardless of path; `None` fails every open.
pub struct MockOpener {
    pdf: Option<MockPdf>,
}

impl MockOpener {
    pub fn new(pdf: MockPdf) -> Self {
        Self { pdf: Some(pdf) }
    }

    pub fn failing() -> Self {
        Self { pdf: None }
    }
}

impl DocumentOpener for MockOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfProcessor>> {
        let pdf = self
            .pdf
            .clone()
            .ok_or_else(|| PdfError::Parse(format!("cannot open {}", path.display())))?;
        bump(&pdf.spy.opened);
        Ok(Box::new(MockDocument { pdf }))
    }
}

/// Reader answering with queued texts, then a default one.
pub struct MockReader {
    backend: Backend,
    default_text: String,
    queued: RefCell<VecDeque<String>>,
    fail: bool,
    calls: Rc<Cell<usize>>,
    modes: Rc<RefCell<Vec<ReadMode>>>,
}

impl MockReader {
    pub fn new(backend: Backend, text: &str) -> Self {
        Self {
            backend,
            default_text: text.to_string(),
            queued: RefCell::new(VecDeque::new()),
            fail: false,
            calls: Rc::new(Cell::new(0)),
            modes: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Answer `texts` in order, then `""`.
    pub fn sequence(backend: Backend, texts: &[&str]) -> Self {
        let reader = Self::new(backend, "");
        reader
            .queued
            .borrow_mut()
            .extend(texts.iter().map(|t| t.to_string()));
        reader
    }

    pub fn failing(backend: Backend) -> Self {
        Self {
            fail: true,
            ..Self::new(backend, "")
        }
    }

    /// Shared handle on the number of `read` calls.
    pub fn calls(&self) -> Rc<Cell<usize>> {
        self.calls.clone()
    }

    /// Shared handle on the modes `read` was called with.
    pub fn modes(&self) -> Rc<RefCell<Vec<ReadMode>>> {
        self.modes.clone()
    }
}

impl TextReader for MockReader {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn read(&self, image: &DynamicImage, mode: ReadMode) -> std::result::Result<OcrResult, OcrError> {
        bump(&self.calls);
        self.modes.borrow_mut().push(mode);
        if self.fail {
            return Err(OcrError::Recognition("mock failure".to_string()));
        }
        let text = self
            .queued
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.default_text.clone());
        Ok(OcrResult::from_text(&text, image.dimensions()))
    }
}

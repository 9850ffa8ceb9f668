//! PDF text and image extraction using lopdf and pdf-extract.

use std::collections::HashSet;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, trace};

use super::{DocumentOpener, ExtractedImage, ImageRef, PageRasterizer, PdfProcessor, Result};
use crate::error::PdfError;

/// Upper bound on `/Parent` hops when resolving inherited page attributes.
const MAX_TREE_DEPTH: usize = 64;

/// PDF document backed by lopdf.
pub struct PdfExtractor {
    document: Document,
    raw_data: Vec<u8>,
    source: PathBuf,
    encrypted: bool,
    rasterizer: PageRasterizer,
}

/// Opens documents as [`PdfExtractor`]s.
#[derive(Debug, Clone, Default)]
pub struct PdfOpener {
    rasterizer: PageRasterizer,
}

impl PdfOpener {
    pub fn new(rasterizer: PageRasterizer) -> Self {
        Self { rasterizer }
    }
}

impl DocumentOpener for PdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn PdfProcessor>> {
        let extractor = PdfExtractor::open_with(path, self.rasterizer.clone())?;
        Ok(Box::new(extractor))
    }
}

impl PdfExtractor {
    /// Open a PDF with the default rasterizer.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, PageRasterizer::default())
    }

    /// Open a PDF, decrypting it when it only carries an empty user password.
    pub fn open_with(path: &Path, rasterizer: PageRasterizer) -> Result<Self> {
        let data = std::fs::read(path)?;
        let mut document = Document::load_mem(&data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let encrypted = document.is_encrypted();
        let raw_data = if encrypted {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract works on bytes, so it needs the decrypted copy
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data
        };

        debug!(
            "Loaded PDF {} with {} pages",
            path.display(),
            document.get_pages().len()
        );

        Ok(Self {
            document,
            raw_data,
            source: path.to_path_buf(),
            encrypted,
            rasterizer,
        })
    }

    /// Whether the file on disk is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Read a string entry of the document information dictionary.
    pub fn metadata(&self, key: &str) -> Option<String> {
        let info = self.document.trailer.get(b"Info").ok()?;
        let (_, info) = self.document.dereference(info).ok()?;
        let value = info.as_dict().ok()?.get(key.as_bytes()).ok()?;
        match self.document.dereference(value).ok()?.1 {
            Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.document
            .get_pages()
            .get(&(page + 1))
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    /// Look up a page attribute, walking up the page tree for inheritable keys.
    fn inherited_attribute(&self, node_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(node_id);
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.document.get_dictionary(current?).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
        }
        None
    }

    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let resources = self.inherited_attribute(page_id, b"Resources")?;
        match self.document.dereference(resources) {
            Ok((_, Object::Dictionary(dict))) => Some(dict),
            _ => None,
        }
    }

    fn decode_image(&self, stream: &Stream) -> Result<ExtractedImage> {
        let dict = &stream.dict;

        let width = image_dimension(dict, b"Width")?;
        let height = image_dimension(dict, b"Height")?;

        trace!("Decoding image object: {}x{}", width, height);

        let filter_name = dict.get(b"Filter").ok().and_then(|filter| match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter_name {
            Some(b"DCTDecode") => {
                // JPEG data is usable as-is
                return Ok(ExtractedImage {
                    data: stream.content.clone(),
                    width,
                    height,
                    format: "jpg".to_string(),
                });
            }
            Some(name @ (b"JPXDecode" | b"CCITTFaxDecode" | b"JBIG2Decode")) => {
                return Err(PdfError::ImageExtraction(format!(
                    "unsupported image filter {}",
                    String::from_utf8_lossy(name)
                )));
            }
            _ => {}
        }

        let data = match stream.decompressed_content() {
            Ok(d) => d,
            Err(_) => stream.content.clone(),
        };

        let color_space = dict.get(b"ColorSpace").ok().and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8) as u8;

        let components = match color_space {
            Some(b"DeviceRGB" | b"RGB" | b"CalRGB") => 3,
            Some(b"DeviceGray" | b"G" | b"CalGray") => 1,
            // ICC-based and indexed spaces: guess from the buffer size
            _ if bits == 8
                && pixel_count(width, height)
                    .and_then(|p| p.checked_mul(3))
                    .is_some_and(|n| data.len() >= n) =>
            {
                3
            }
            _ => 1,
        };

        let image = create_image_from_raw(&data, width, height, components, bits).ok_or_else(|| {
            PdfError::ImageExtraction(format!(
                "cannot decode {}x{} image ({} components, {} bits, {} bytes)",
                width,
                height,
                components,
                bits,
                data.len()
            ))
        })?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| PdfError::ImageExtraction(e.to_string()))?;

        Ok(ExtractedImage {
            data: png,
            width,
            height,
            format: "png".to_string(),
        })
    }
}

impl PdfProcessor for PdfExtractor {
    fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        self.document
            .extract_text(&[page + 1])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    fn layout_text(&self) -> Result<String> {
        // pdf-extract panics on some malformed fonts
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&self.raw_data)
        }));

        match extracted {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(PdfError::TextExtraction(e.to_string())),
            Err(_) => Err(PdfError::TextExtraction(
                "layout extractor panicked".to_string(),
            )),
        }
    }

    fn page_images(&self, page: u32) -> Result<Vec<ImageRef>> {
        let page_id = self.page_id(page)?;
        let mut images = Vec::new();

        let Some(resources) = self.page_resources(page_id) else {
            return Ok(images);
        };
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(images);
        };
        let Ok((_, Object::Dictionary(xobjects))) = self.document.dereference(xobjects) else {
            return Ok(images);
        };

        let mut seen: HashSet<ObjectId> = HashSet::new();
        for (name, obj) in xobjects.iter() {
            let Object::Reference(id) = obj else {
                continue;
            };
            if !seen.insert(*id) {
                continue;
            }
            if let Ok(Object::Stream(stream)) = self.document.get_object(*id) {
                let is_image = stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .map(|s| s == b"Image")
                    .unwrap_or(false);
                if is_image {
                    images.push(ImageRef {
                        object_id: *id,
                        name: String::from_utf8_lossy(name).into_owned(),
                    });
                }
            }
        }

        debug!("Found {} images on page {}", images.len(), page);
        Ok(images)
    }

    fn extract_image(&self, image: &ImageRef) -> Result<ExtractedImage> {
        match self.document.get_object(image.object_id) {
            Ok(Object::Stream(stream)) => self.decode_image(stream),
            Ok(_) => Err(PdfError::ImageExtraction(format!(
                "object {} {} R is not a stream",
                image.object_id.0, image.object_id.1
            ))),
            Err(e) => Err(PdfError::ImageExtraction(e.to_string())),
        }
    }

    fn render_page(&self, page: u32, dpi: u32, dest: &Path) -> Result<PathBuf> {
        self.page_id(page)?;
        self.rasterizer.render(&self.source, page, dpi, dest)
    }

    fn rotation(&self, page: u32) -> Result<i64> {
        let page_id = self.page_id(page)?;
        let rotate = self
            .inherited_attribute(page_id, b"Rotate")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        Ok(rotate.rem_euclid(360))
    }
}

/// A positive `/Width` or `/Height` entry of an image dictionary.
fn image_dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    let name = String::from_utf8_lossy(key);
    let value = dict
        .get(key)
        .and_then(|o| o.as_i64())
        .map_err(|e| PdfError::ImageExtraction(format!("missing {}: {}", name, e)))?;
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| PdfError::ImageExtraction(format!("invalid {}: {}", name, value)))
}

fn pixel_count(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

fn create_image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    components: usize,
    bits_per_component: u8,
) -> Option<DynamicImage> {
    let pixels = pixel_count(width, height)?;

    match (components, bits_per_component) {
        (3, 8) => RgbImage::from_raw(width, height, data.get(..pixels.checked_mul(3)?)?.to_vec())
            .map(DynamicImage::ImageRgb8),
        (1, 8) => GrayImage::from_raw(width, height, data.get(..pixels)?.to_vec())
            .map(DynamicImage::ImageLuma8),
        (1, 1) => {
            // Rows are padded to a byte boundary
            let row_bytes = (width as usize).div_ceil(8);
            if data.len() < row_bytes.checked_mul(height as usize)? {
                return None;
            }
            let image = GrayImage::from_fn(width, height, |x, y| {
                let byte = data[y as usize * row_bytes + x as usize / 8];
                let bit = (byte >> (7 - (x % 8))) & 1;
                Luma([if bit == 1 { 255 } else { 0 }])
            });
            Some(DynamicImage::ImageLuma8(image))
        }
        _ => {
            trace!(
                "Unsupported image layout: {} components, {} bits",
                components, bits_per_component
            );
            None
        }
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise byte-wise).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use pretty_assertions::assert_eq;
    use lopdf::dictionary;

    #[test]
    fn test_page_text_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_text_pdf(dir.path(), &["Hello World!", "Second page"]);

        let extractor = PdfExtractor::open(&path).unwrap();
        assert_eq!(extractor.page_count(), 2);
        assert!(extractor.page_text(0).unwrap().contains("Hello World!"));
        assert!(extractor.page_text(1).unwrap().contains("Second page"));
        assert!(matches!(extractor.page_text(2), Err(PdfError::InvalidPage(2))));
    }

    #[test]
    fn test_text_page_has_no_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_text_pdf(dir.path(), &["Hello"]);

        let extractor = PdfExtractor::open(&path).unwrap();
        assert!(extractor.page_images(0).unwrap().is_empty());
    }

    #[test]
    fn test_extract_raw_gray_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_image_pdf(dir.path());

        let extractor = PdfExtractor::open(&path).unwrap();
        let images = extractor.page_images(0).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].name, "Im0");

        let extracted = extractor.extract_image(&images[0]).unwrap();
        assert_eq!(extracted.format, "png");
        assert_eq!((extracted.width, extracted.height), (2, 2));

        let decoded = image::load_from_memory(&extracted.data).unwrap().to_luma8();
        assert_eq!(decoded.get_pixel(0, 0)[0], 0);
        assert_eq!(decoded.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_rotation_inherited_from_page_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_image_pdf(dir.path());

        let extractor = PdfExtractor::open(&path).unwrap();
        assert_eq!(extractor.rotation(0).unwrap(), 90);
    }

    #[test]
    fn test_metadata_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_text_pdf(dir.path(), &["Hello"]);

        let extractor = PdfExtractor::open(&path).unwrap();
        assert_eq!(extractor.metadata("Title").as_deref(), Some("Sample"));
        assert_eq!(extractor.metadata("Author"), None);
        assert!(!extractor.is_encrypted());
    }

    #[test]
    fn test_open_garbage_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        assert!(PdfExtractor::open(&path).is_err());
        assert!(PdfExtractor::open(&dir.path().join("missing.pdf")).is_err());
    }

    #[test]
    fn test_one_bit_image_unpacking() {
        // 3x2, rows padded to one byte: 101 / 010
        let data = [0b1010_0000u8, 0b0100_0000];
        let image = create_image_from_raw(&data, 3, 2, 1, 1).unwrap().to_luma8();
        assert_eq!(image.get_pixel(0, 0)[0], 255);
        assert_eq!(image.get_pixel(1, 0)[0], 0);
        assert_eq!(image.get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn test_bad_image_dimensions_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = testutil::write_image_pdf(dir.path());
        let extractor = PdfExtractor::open(&path).unwrap();

        for (width, height) in [(-2i64, 2i64), (2, 0), (2, -1), (1i64 << 40, 2)] {
            let stream = Stream::new(
                lopdf::dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                vec![0u8; 4],
            );
            let err = extractor.decode_image(&stream).unwrap_err();
            assert!(
                matches!(err, PdfError::ImageExtraction(_)),
                "{}x{}: {:?}",
                width,
                height,
                err
            );
        }
    }

    #[test]
    fn test_huge_raw_image_does_not_overflow() {
        let data = [0u8; 12];
        assert!(create_image_from_raw(&data, u32::MAX, u32::MAX, 3, 8).is_none());
        assert!(create_image_from_raw(&data, u32::MAX, u32::MAX, 1, 1).is_none());
    }

    #[test]
    fn test_decode_utf16_string() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
        assert_eq!(decode_pdf_string(b"plain"), "plain");
    }
}

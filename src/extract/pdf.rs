//! PDF extraction
//!
//! Text layer via pdf-extract (page by page), embedded raster images and the
//! document info dictionary via lopdf. Both parsers can panic on malformed
//! input, so every entry point runs under `catch_unwind`.

use super::vision::encode_for_vision;
use crate::error::ExtractError;
use chrono::NaiveDate;
use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

/// Images smaller than this on either side are treated as decoration
const MIN_IMAGE_SIDE: i64 = 32;

/// Text and figures pulled out of one PDF
#[derive(Debug, Default)]
pub struct PdfContent {
    /// Cleaned text, one entry per page
    pub pages: Vec<String>,
    /// JPEG-encoded embedded images, in object order
    pub images: Vec<Vec<u8>>,
}

impl PdfContent {
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Read page text and up to `max_images` embedded images
pub fn read_pdf(path: &Path, max_images: usize, max_dimension: u32) -> Result<PdfContent, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let text_result = extract_pages(&bytes);
    let images = if max_images > 0 {
        extract_images(&bytes, max_images, max_dimension)
    } else {
        Vec::new()
    };

    let pages = match text_result {
        Ok(pages) => pages,
        Err(message) if images.is_empty() => {
            tracing::warn!("[PdfExtract] {} for {}", message, path.display());
            return Err(ExtractError::parse("PDF", message));
        }
        Err(message) => {
            tracing::debug!(
                "[PdfExtract] No text layer ({}), continuing with {} images from {}",
                message,
                images.len(),
                path.display()
            );
            Vec::new()
        }
    };

    tracing::debug!(
        "[PdfExtract] {} pages, {} images from {}",
        pages.len(),
        images.len(),
        path.display()
    );

    Ok(PdfContent { pages, images })
}

fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, String> {
    match catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem_by_pages(bytes))) {
        Ok(Ok(pages)) => Ok(pages
            .iter()
            .map(|page| super::document_parser::clean_text(page))
            .collect()),
        Ok(Err(e)) => Err(format!("text extraction failed: {}", e)),
        Err(_panic) => Err("text extraction panicked, likely malformed fonts".to_string()),
    }
}

fn load_document(bytes: &[u8]) -> Option<Document> {
    match catch_unwind(AssertUnwindSafe(|| Document::load_mem(bytes))) {
        Ok(Ok(doc)) => Some(doc),
        Ok(Err(e)) => {
            tracing::debug!("[PdfExtract] lopdf could not load document: {}", e);
            None
        }
        Err(_panic) => {
            tracing::warn!("[PdfExtract] lopdf panicked while loading document");
            None
        }
    }
}

/// Decode embedded images that are plain JPEG or 8-bit Gray/RGB rasters
fn extract_images(bytes: &[u8], max_images: usize, max_dimension: u32) -> Vec<Vec<u8>> {
    let Some(doc) = load_document(bytes) else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for object in doc.objects.values() {
        if images.len() >= max_images {
            break;
        }
        let Object::Stream(stream) = object else {
            continue;
        };
        if !is_name(stream.dict.get(b"Subtype").ok(), b"Image") {
            continue;
        }

        let width = int_entry(&stream.dict, b"Width");
        let height = int_entry(&stream.dict, b"Height");
        if width < MIN_IMAGE_SIDE || height < MIN_IMAGE_SIDE {
            continue;
        }

        let decoded = match filters(&stream.dict).as_slice() {
            [only] if only.as_slice() == b"DCTDecode" => {
                image::load_from_memory(&stream.content).ok()
            }
            [] => raster_image(stream.content.clone(), width as u32, height as u32),
            [only] if only.as_slice() == b"FlateDecode" => stream
                .decompressed_content()
                .ok()
                .and_then(|data| raster_image(data, width as u32, height as u32)),
            _ => None,
        };

        if let Some(img) = decoded {
            match encode_for_vision(img, max_dimension) {
                Ok(jpeg) => images.push(jpeg),
                Err(e) => tracing::debug!("[PdfExtract] Skipping image: {}", e),
            }
        }
    }

    images
}

/// Wrap raw 8-bit samples, inferring channels from the buffer size
fn raster_image(data: Vec<u8>, width: u32, height: u32) -> Option<DynamicImage> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    if pixels == 0 {
        return None;
    }
    match data.len() / pixels {
        3 => {
            let mut data = data;
            data.truncate(pixels * 3);
            RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
        }
        1 => {
            let mut data = data;
            data.truncate(pixels);
            GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
        }
        _ => None,
    }
}

fn is_name(object: Option<&Object>, expected: &[u8]) -> bool {
    matches!(object, Some(Object::Name(name)) if name.as_slice() == expected)
}

fn int_entry(dict: &Dictionary, key: &[u8]) -> i64 {
    dict.get(key).ok().and_then(|o| o.as_i64().ok()).unwrap_or(0)
}

fn filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Object::Name(name) => Some(name.clone()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// `CreationDate` from the document info dictionary
pub fn creation_date(path: &Path) -> Option<NaiveDate> {
    let bytes = std::fs::read(path).ok()?;
    let doc = load_document(&bytes)?;

    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    match info.as_dict().ok()?.get(b"CreationDate").ok()? {
        Object::String(raw, _) => parse_pdf_date(raw),
        _ => None,
    }
}

/// `D:YYYYMMDDHHmmSSOHH'mm'`; only the calendar date is used
fn parse_pdf_date(raw: &[u8]) -> Option<NaiveDate> {
    let text = String::from_utf8_lossy(raw);
    let digits = text.trim().trim_start_matches("D:");
    NaiveDate::parse_from_str(digits.get(..8)?, "%Y%m%d").ok()
}


#[cfg(test)]
mod tests {
    use super::fixtures::{sample_jpeg, write_pdf};
    use super::*;

    #[test]
    fn test_parse_pdf_date() {
        assert_eq!(
            parse_pdf_date(b"D:20230417093000+02'00'"),
            NaiveDate::from_ymd_opt(2023, 4, 17)
        );
        assert_eq!(parse_pdf_date(b"20191231"), NaiveDate::from_ymd_opt(2019, 12, 31));
        assert_eq!(parse_pdf_date(b"D:2023"), None);
        assert_eq!(parse_pdf_date(b"D:20231341"), None);
    }

    #[test]
    fn test_raster_image_infers_channels() {
        let rgb = raster_image(vec![0u8; 4 * 4 * 3], 4, 4).unwrap();
        assert!(matches!(rgb, DynamicImage::ImageRgb8(_)));
        let gray = raster_image(vec![0u8; 16], 4, 4).unwrap();
        assert!(matches!(gray, DynamicImage::ImageLuma8(_)));
        assert!(raster_image(vec![0u8; 10], 4, 4).is_none());
    }

    #[test]
    fn test_garbage_pdf_is_parse_error() {
        let file = tempfile::NamedTempFile::with_suffix(".pdf").unwrap();
        std::fs::write(file.path(), b"%PDF-1.4 truncated").unwrap();
        let result = read_pdf(file.path(), 2, 1600);
        assert!(matches!(result, Err(ExtractError::Parse { .. })));
        assert_eq!(creation_date(file.path()), None);
    }

    #[test]
    fn test_reads_text_layer_and_embedded_jpeg() {
        let file = tempfile::NamedTempFile::with_suffix(".pdf").unwrap();
        write_pdf(file.path(), Some("Invoice 2041"), Some(sample_jpeg()), None);

        let content = read_pdf(file.path(), 2, 256).unwrap();
        assert!(content.text().contains("Invoice"));
        assert_eq!(content.images.len(), 1);
        assert!(image::load_from_memory(&content.images[0]).is_ok());
    }

    #[test]
    fn test_image_limit_is_respected() {
        let file = tempfile::NamedTempFile::with_suffix(".pdf").unwrap();
        write_pdf(file.path(), Some("Invoice"), Some(sample_jpeg()), None);

        let content = read_pdf(file.path(), 0, 256).unwrap();
        assert!(content.images.is_empty());
    }

    #[test]
    fn test_creation_date_from_info_dictionary() {
        let file = tempfile::NamedTempFile::with_suffix(".pdf").unwrap();
        write_pdf(file.path(), Some("Invoice"), None, Some("D:20230417093000+02'00'"));
        assert_eq!(creation_date(file.path()), NaiveDate::from_ymd_opt(2023, 4, 17));

        let undated = tempfile::NamedTempFile::with_suffix(".pdf").unwrap();
        write_pdf(undated.path(), Some("Invoice"), None, None);
        assert_eq!(creation_date(undated.path()), None);
    }
}

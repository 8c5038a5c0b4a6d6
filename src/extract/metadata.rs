//! Embedded date probing
//!
//! Reads dates the file carries about itself: EXIF capture time for images,
//! `CreationDate` for PDFs. Absent or invalid values are `None`, never errors.

use crate::models::FileKind;
use chrono::NaiveDate;
use exif::{In, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// EXIF tags tried in order
const EXIF_DATE_TAGS: [Tag; 2] = [Tag::DateTimeOriginal, Tag::DateTime];

pub fn read_embedded_date(path: &Path, kind: FileKind) -> Option<NaiveDate> {
    match kind {
        FileKind::Image => exif_capture_date(path),
        FileKind::Pdf => super::pdf::creation_date(path),
        _ => None,
    }
}

fn exif_capture_date(path: &Path) -> Option<NaiveDate> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::trace!("[Metadata] No EXIF in {}: {}", path.display(), e);
            return None;
        }
    };

    EXIF_DATE_TAGS.iter().find_map(|tag| {
        let field = exif.get_field(*tag, In::PRIMARY)?;
        match &field.value {
            Value::Ascii(values) => values.first().and_then(|raw| parse_exif_date(raw)),
            _ => None,
        }
    })
}

/// `YYYY:MM:DD HH:MM:SS`; zeroed placeholder dates are rejected by chrono
fn parse_exif_date(raw: &[u8]) -> Option<NaiveDate> {
    let text = std::str::from_utf8(raw).ok()?;
    NaiveDate::parse_from_str(text.get(..10)?, "%Y:%m:%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exif_date() {
        assert_eq!(
            parse_exif_date(b"2018:06:30 17:45:02"),
            NaiveDate::from_ymd_opt(2018, 6, 30)
        );
        assert_eq!(parse_exif_date(b"0000:00:00 00:00:00"), None);
        assert_eq!(parse_exif_date(b"2018"), None);
    }

    #[test]
    fn test_image_without_exif_has_no_date() {
        let file = tempfile::NamedTempFile::with_suffix(".png").unwrap();
        image::RgbImage::new(2, 2).save(file.path()).unwrap();
        assert_eq!(read_embedded_date(file.path(), FileKind::Image), None);
    }

    #[test]
    fn test_text_files_have_no_embedded_date() {
        assert_eq!(read_embedded_date(Path::new("/nonexistent.txt"), FileKind::Text), None);
    }
}

//! Document Parser Module
//!
//! Pure Rust text extraction for text-like documents. Works out of the box
//! without LibreOffice or any other system libraries.
//!
//! ## Supported Formats
//! - Text: .txt, .md (direct read)
//! - Word: .docx via docx-rs
//! - Spreadsheets: .xlsx, .xls via calamine, .csv (direct read)
//! - Presentations: .pptx slide text via zip
//!
//! Output is cleaned (blank lines dropped, lines trimmed) and hard-cut at the
//! character budget.

use crate::error::ExtractError;
use calamine::{open_workbook_auto, Reader};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::Path;

/// Text runs inside a DrawingML slide
static SLIDE_TEXT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a:t>([^<]*)</a:t>").expect("valid slide text regex"));

/// `ppt/slides/slide12.xml` -> 12
static SLIDE_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("valid slide entry regex"));

/// How the text was laid out in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLayout {
    /// Running prose
    Prose,
    /// Rows, sheets or slides flattened to lines
    Structured,
}

/// Result of document parsing
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub text: String,
    pub layout: TextLayout,
    /// Characters before truncation
    pub original_chars: usize,
}

/// Document parser using pure Rust crates
pub struct DocumentParser {
    max_chars: usize,
}

impl DocumentParser {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Parse a document and extract text
    pub fn parse(&self, path: &Path) -> Result<ParsedDocument, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase());

        let (raw, layout) = match ext.as_deref() {
            Some("txt") | Some("md") => (read_plain_text(path)?, TextLayout::Prose),
            Some("csv") => (read_plain_text(path)?, TextLayout::Structured),
            Some("docx") => (extract_docx(path)?, TextLayout::Prose),
            Some("xlsx") | Some("xls") => (extract_workbook(path)?, TextLayout::Structured),
            Some("pptx") => (extract_pptx(path)?, TextLayout::Structured),
            other => {
                return Err(ExtractError::Unsupported(
                    other.unwrap_or("no extension").to_string(),
                ))
            }
        };

        let cleaned = clean_text(&raw);
        if cleaned.is_empty() {
            return Err(ExtractError::Empty);
        }

        let original_chars = cleaned.chars().count();
        let text = truncate_chars(&cleaned, self.max_chars);

        tracing::debug!(
            "[DocumentParser] {} chars ({} kept) from {}",
            original_chars,
            text.chars().count(),
            path.display()
        );

        Ok(ParsedDocument {
            text,
            layout,
            original_chars,
        })
    }
}

fn read_failure(path: &Path) -> impl FnOnce(std::io::Error) -> ExtractError + '_ {
    move |source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    }
}

/// Read plain text file directly, tolerating invalid UTF-8
fn read_plain_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(read_failure(path))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extract text from XLSX/XLS using calamine
fn extract_workbook(path: &Path) -> Result<String, ExtractError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| ExtractError::parse("spreadsheet", e))?;

    let mut all_text = String::new();
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    for sheet_name in &sheet_names {
        let Ok(range) = workbook.worksheet_range(sheet_name) else {
            tracing::debug!("[DocumentParser] Skipping unreadable sheet {}", sheet_name);
            continue;
        };

        all_text.push_str(&format!("\n=== Sheet: {} ===\n", sheet_name));
        for row in range.rows() {
            let row_text: Vec<String> = row
                .iter()
                .map(|cell| cell.to_string())
                .filter(|s| !s.is_empty())
                .collect();

            if !row_text.is_empty() {
                all_text.push_str(&row_text.join(" | "));
                all_text.push('\n');
            }
        }
    }

    Ok(all_text)
}

/// Extract text from DOCX using docx-rs
fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(read_failure(path))?;
    let doc = docx_rs::read_docx(&bytes).map_err(|e| ExtractError::parse("DOCX", e))?;

    let mut all_text = String::new();
    for child in &doc.document.children {
        extract_docx_content(child, &mut all_text);
    }
    Ok(all_text)
}

fn push_paragraph(para: &docx_rs::Paragraph, output: &mut String) {
    for child in &para.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => push_run(run, output),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = inner {
                        push_run(run, output);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(run: &docx_rs::Run, output: &mut String) {
    for run_child in &run.children {
        if let docx_rs::RunChild::Text(text) = run_child {
            output.push_str(&text.text);
        }
    }
}

/// Paragraphs become lines; table rows become `|`-joined lines
fn extract_docx_content(element: &docx_rs::DocumentChild, output: &mut String) {
    match element {
        docx_rs::DocumentChild::Paragraph(para) => {
            push_paragraph(para, output);
            output.push('\n');
        }
        docx_rs::DocumentChild::Table(table) => {
            for row in &table.rows {
                let docx_rs::TableChild::TableRow(tr) = row;
                for cell in &tr.cells {
                    let docx_rs::TableRowChild::TableCell(tc) = cell;
                    for child in &tc.children {
                        if let docx_rs::TableCellContent::Paragraph(para) = child {
                            push_paragraph(para, output);
                            output.push_str(" | ");
                        }
                    }
                }
                output.push('\n');
            }
        }
        _ => {}
    }
}

/// Extract slide text from PPTX in slide order
fn extract_pptx(path: &Path) -> Result<String, ExtractError> {
    let file = std::fs::File::open(path).map_err(read_failure(path))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractError::parse("PPTX", e))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = SLIDE_ENTRY.captures(name)?[1].parse().ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut all_text = String::new();
    for (number, name) in slides {
        let mut xml = String::new();
        archive
            .by_name(&name)
            .map_err(|e| ExtractError::parse("PPTX", e))?
            .read_to_string(&mut xml)
            .map_err(read_failure(path))?;

        let runs: Vec<String> = SLIDE_TEXT_RUN
            .captures_iter(&xml)
            .map(|caps| unescape_xml(&caps[1]))
            .filter(|t| !t.trim().is_empty())
            .collect();

        if !runs.is_empty() {
            all_text.push_str(&format!("\n=== Slide {} ===\n", number));
            all_text.push_str(&runs.join(" "));
            all_text.push('\n');
        }
    }

    Ok(all_text)
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Clean extracted text
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hard cut at `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_pos, _)) => text[..byte_pos].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_plain_text_parsing() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "This is a test document with some content.").unwrap();
        writeln!(file, "It has multiple lines and words.").unwrap();

        let parsed = DocumentParser::new(3000).parse(file.path()).unwrap();
        assert!(parsed.text.contains("test document"));
        assert_eq!(parsed.layout, TextLayout::Prose);
    }

    #[test]
    fn test_csv_is_structured() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        writeln!(file, "region,total").unwrap();
        writeln!(file, "north,120").unwrap();

        let parsed = DocumentParser::new(3000).parse(file.path()).unwrap();
        assert_eq!(parsed.layout, TextLayout::Structured);
        assert_eq!(parsed.text, "region,total\nnorth,120");
    }

    #[test]
    fn test_budget_is_hard_cut() {
        let mut file = NamedTempFile::with_suffix(".md").unwrap();
        write!(file, "{}", "word. ".repeat(1000)).unwrap();

        let parsed = DocumentParser::new(100).parse(file.path()).unwrap();
        assert_eq!(parsed.text.chars().count(), 100);
        assert_eq!(parsed.original_chars, 5999);
    }

    #[test]
    fn test_empty_document_is_error() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "   \n\n  ").unwrap();
        let result = DocumentParser::new(3000).parse(file.path());
        assert!(matches!(result, Err(ExtractError::Empty)));
    }

    #[test]
    fn test_corrupt_docx_is_parse_error() {
        let mut file = NamedTempFile::with_suffix(".docx").unwrap();
        writeln!(file, "definitely not a zip").unwrap();
        let result = DocumentParser::new(3000).parse(file.path());
        assert!(matches!(result, Err(ExtractError::Parse { .. })));
    }

    #[test]
    fn test_pptx_slides_in_order() {
        let file = NamedTempFile::with_suffix(".pptx").unwrap();
        {
            let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file("ppt/slides/slide10.xml", options).unwrap();
            zip.write_all(b"<p:sld><a:t>Closing</a:t></p:sld>").unwrap();
            zip.start_file("ppt/slides/slide2.xml", options).unwrap();
            zip.write_all(b"<p:sld><a:t>Q3 &amp; Q4</a:t><a:t>Roadmap</a:t></p:sld>").unwrap();
            zip.start_file("ppt/presentation.xml", options).unwrap();
            zip.write_all(b"<p:presentation/>").unwrap();
            zip.finish().unwrap();
        }

        let parsed = DocumentParser::new(3000).parse(file.path()).unwrap();
        assert_eq!(
            parsed.text,
            "=== Slide 2 ===\nQ3 & Q4 Roadmap\n=== Slide 10 ===\nClosing"
        );
    }

    #[test]
    fn test_docx_paragraphs_and_table_rows() {
        use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};

        let file = NamedTempFile::with_suffix(".docx").unwrap();
        let cell = |text: &str| TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)));
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Meeting notes")))
            .add_table(Table::new(vec![TableRow::new(vec![cell("Budget"), cell("1200")])]))
            .build()
            .pack(file.reopen().unwrap())
            .unwrap();

        let parsed = DocumentParser::new(3000).parse(file.path()).unwrap();
        assert_eq!(parsed.layout, TextLayout::Prose);
        assert!(parsed.text.starts_with("Meeting notes\n"));
        assert!(parsed.text.contains("Budget | 1200"));
    }

    #[test]
    fn test_xlsx_sheets_and_rows() {
        let file = NamedTempFile::with_suffix(".xlsx").unwrap();
        {
            let mut zip = zip::ZipWriter::new(file.reopen().unwrap());
            let options = zip::write::SimpleFileOptions::default();
            let entries: [(&str, &str); 5] = [
                (
                    "[Content_Types].xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#,
                ),
                (
                    "_rels/.rels",
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
                ),
                (
                    "xl/workbook.xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sales" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
                ),
                (
                    "xl/_rels/workbook.xml.rels",
                    r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
                ),
                (
                    "xl/worksheets/sheet1.xml",
                    r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Region</t></is></c><c r="B1" t="inlineStr"><is><t>Total</t></is></c></row><row r="2"><c r="A2" t="inlineStr"><is><t>North</t></is></c><c r="B2"><v>120</v></c></row></sheetData></worksheet>"#,
                ),
            ];
            for (name, xml) in entries {
                zip.start_file(name, options).unwrap();
                zip.write_all(xml.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }

        let parsed = DocumentParser::new(3000).parse(file.path()).unwrap();
        assert_eq!(parsed.layout, TextLayout::Structured);
        assert!(parsed.text.contains("=== Sheet: Sales ==="));
        assert!(parsed.text.contains("Region | Total"));
        assert!(parsed.text.contains("North | 120"));
    }

    #[test]
    fn test_truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn test_clean_text() {
        let messy = "  Line 1  \n\n  Line 2  \n  \n  Line 3  ";
        assert_eq!(clean_text(messy), "Line 1\nLine 2\nLine 3");
    }
}

//! Response parsing for model output
//!
//! Models are asked for JSON but frequently wrap it in prose or code fences,
//! or answer with labeled lines instead. Both shapes are accepted; anything
//! else yields empty fields for the caller to fill with sentinels.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid date regex"));

/// Fields recovered from a free-form metadata response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseFields {
    pub description: Option<String>,
    pub category: Option<String>,
    pub filename: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Extract JSON object from a response that might contain markdown or other text
///
/// Handles:
/// - ```json code blocks
/// - Plain ``` code blocks
/// - Raw JSON objects
pub fn extract_json_object(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let json_start = start + 7;
        if let Some(end) = text[json_start..].find("```") {
            return Some(text[json_start..json_start + end].trim());
        }
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        let content_start = text[block_start..]
            .find('\n')
            .map(|i| block_start + i + 1)
            .unwrap_or(block_start);
        if let Some(end) = text[content_start..].find("```") {
            let block = text[content_start..content_start + end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a metadata response: JSON first, labeled lines as fallback
pub fn parse_metadata_response(text: &str) -> ResponseFields {
    if let Some(fields) = extract_json_object(text).and_then(parse_json_fields) {
        return fields;
    }
    parse_labeled_fields(text)
}

fn parse_json_fields(json: &str) -> Option<ResponseFields> {
    let value: Value = serde_json::from_str(json).ok()?;
    let object = value.as_object()?;

    let pick = |keys: &[&str]| {
        keys.iter()
            .find_map(|k| object.get(*k).and_then(Value::as_str))
            .and_then(non_empty)
    };

    let fields = ResponseFields {
        description: pick(&["description", "summary"]),
        category: pick(&["category", "foldername", "folder_name", "folder"]),
        filename: pick(&["filename", "file_name", "name"]),
        date: pick(&["date"]).and_then(|d| parse_date_response(&d)),
    };

    if fields == ResponseFields::default() {
        None
    } else {
        Some(fields)
    }
}

/// Accepts `Description: ...`, `Category: ...` / `Folder: ...`, `Filename: ...`
fn parse_labeled_fields(text: &str) -> ResponseFields {
    let mut fields = ResponseFields::default();

    for line in text.lines() {
        let line = line.trim().trim_start_matches(['-', '*', '#', ' ']);
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_matches(['*', '"', '`']).trim();
        let Some(value) = non_empty(value) else {
            continue;
        };

        match label.trim().trim_matches('*').to_lowercase().as_str() {
            "description" | "summary" => {
                fields.description.get_or_insert(value);
            }
            "category" | "folder" | "folder name" | "foldername" => {
                fields.category.get_or_insert(value);
            }
            "filename" | "file name" => {
                fields.filename.get_or_insert(value);
            }
            "date" => {
                if fields.date.is_none() {
                    fields.date = parse_date_response(&value);
                }
            }
            _ => {}
        }
    }

    fields
}

/// Parse a date answer (`YYYY-MM-DD` somewhere in the text, or `null`)
pub fn parse_date_response(text: &str) -> Option<NaiveDate> {
    ISO_DATE.captures_iter(text).find_map(|caps| {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_from_code_block() {
        let text = r#"Here's the result:
```json
{"key": "value", "number": 42}
```
That's it."#;
        let result = extract_json_object(text).unwrap();
        assert!(result.starts_with('{'));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn test_extract_json_object_raw() {
        let text = r#"Result: {"name": "test"} done"#;
        assert_eq!(extract_json_object(text), Some(r#"{"name": "test"}"#));
    }

    #[test]
    fn test_parse_json_response() {
        let text = r#"Sure! {"description": "Quarterly numbers", "foldername": "Work", "filename": "Quarterly Sales Report"}"#;
        let fields = parse_metadata_response(text);
        assert_eq!(fields.description.as_deref(), Some("Quarterly numbers"));
        assert_eq!(fields.category.as_deref(), Some("Work"));
        assert_eq!(fields.filename.as_deref(), Some("Quarterly Sales Report"));
        assert_eq!(fields.date, None);
    }

    #[test]
    fn test_parse_labeled_response() {
        let text = "**Description:** A photo of a beach at sunset\n**Category:** Travel\nFilename: beach_sunset";
        let fields = parse_metadata_response(text);
        assert_eq!(fields.description.as_deref(), Some("A photo of a beach at sunset"));
        assert_eq!(fields.category.as_deref(), Some("Travel"));
        assert_eq!(fields.filename.as_deref(), Some("beach_sunset"));
    }

    #[test]
    fn test_unparseable_response_is_empty() {
        let fields = parse_metadata_response("I cannot help with that.");
        assert_eq!(fields, ResponseFields::default());
    }

    #[test]
    fn test_null_fields_are_absent() {
        let fields = parse_metadata_response(r#"{"description": "x", "foldername": "null", "filename": ""}"#);
        assert_eq!(fields.description.as_deref(), Some("x"));
        assert_eq!(fields.category, None);
        assert_eq!(fields.filename, None);
    }

    #[test]
    fn test_parse_date_response() {
        assert_eq!(
            parse_date_response("The date is 2021-03-14."),
            NaiveDate::from_ymd_opt(2021, 3, 14)
        );
        assert_eq!(parse_date_response("null"), None);
        assert_eq!(parse_date_response("2021-02-30"), None);
    }
}

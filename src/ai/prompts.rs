use crate::models::FileKind;

/// Vision prompt for photos and standalone images
pub const IMAGE_DESCRIPTION_PROMPT: &str = "Please provide a detailed description of this image, focusing on the main subject and any important details.";

/// Vision prompt for figures embedded in PDFs
pub const PDF_IMAGE_CAPTION_PROMPT: &str = "Describe this image in detail, focusing on any text or important visual information.";

/// Build the content-mode prompt for a text excerpt
pub fn build_content_prompt(kind: FileKind, file_name: &str, excerpt: &str) -> String {
    let subject = match kind {
        FileKind::Audio => "the following audio transcription",
        _ => "the following text",
    };

    format!(
        r#"Analyze {subject} and provide a concise description, a suitable folder name (max 2 words, nouns only), and a descriptive filename (max 3 words, nouns only, underscores for spaces).

Original filename: {file_name}
Content type: {kind}

Respond in JSON only:
{{"description": "...", "foldername": "...", "filename": "..."}}

Example:
{{"description": "A quarterly summary of regional sales figures.", "foldername": "Work", "filename": "Quarterly_Sales_Report"}}

Content:
{excerpt}"#,
        subject = subject,
        file_name = file_name,
        kind = kind.label(),
        excerpt = excerpt,
    )
}

/// Build the prompt that turns an image description into folder and filename
pub fn build_image_naming_prompt(file_name: &str, description: &str) -> String {
    format!(
        r#"Based on the following image description, provide a suitable folder name (max 2 words, nouns only) and a descriptive filename (max 3 words, nouns only, underscores for spaces). If the description shows when the picture was taken, estimate that date; otherwise use null.

Original filename: {file_name}

Respond in JSON only:
{{"foldername": "...", "filename": "...", "date": "YYYY-MM-DD or null"}}

Example:
{{"foldername": "Travel", "filename": "Beach_Sunset", "date": null}}

Description:
{description}"#,
        file_name = file_name,
        description = description,
    )
}

/// Build the date-mode prompt
pub fn build_date_prompt(excerpt: &str) -> String {
    format!(
        "Extract a date in YYYY-MM-DD format from the following text. If no date is found, output 'null'.\n\n{}",
        excerpt
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_prompt_mentions_transcription_for_audio() {
        let prompt = build_content_prompt(FileKind::Audio, "memo.m4a", "hello world");
        assert!(prompt.contains("audio transcription"));
        assert!(prompt.contains("memo.m4a"));
        assert!(prompt.ends_with("hello world"));
    }

    #[test]
    fn test_date_prompt_carries_excerpt() {
        let prompt = build_date_prompt("Signed on March 3rd, 2020");
        assert!(prompt.contains("YYYY-MM-DD"));
        assert!(prompt.contains("March 3rd"));
    }

    #[test]
    fn test_image_naming_prompt_asks_for_date() {
        let prompt = build_image_naming_prompt("IMG_7.png", "A cake with a 2015 banner");
        assert!(prompt.contains(r#""date": "YYYY-MM-DD or null""#));
        assert!(prompt.ends_with("A cake with a 2015 banner"));
    }
}

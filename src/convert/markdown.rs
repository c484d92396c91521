//! Markdown to DOCX converter.

use crate::docx::{is_xml_char, write_package};
use crate::error::{Error, Result, Warning};
use crate::markup::parse_markup;
use crate::render::render_native;

use super::{ConvertOptions, ConvertResult, DocumentConverter};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Markdown document converter.
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter {
    _private: (),
}

impl MarkdownConverter {
    /// Create a new Markdown converter.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentConverter for MarkdownConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn name(&self) -> &str {
        "markdown"
    }

    fn output_extension(&self) -> &str {
        "docx"
    }

    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::MalformedInput(format!("Markdown is not valid UTF-8: {}", e)))?;

        let mut parsed = parse_markup(text, &options.style, &options.parse)?;
        let native = render_native(&parsed.document, &parsed.style)?;
        let content = write_package(&native)?;

        let dropped = text.chars().filter(|c| !is_xml_char(*c)).count();
        if dropped > 0 {
            parsed.warnings.push(Warning::DroppedCharacters(dropped));
        }

        Ok(ConvertResult::new(content, parsed.document, parsed.warnings).with_mime_type(DOCX_MIME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{detect_format_from_bytes, Format};

    #[test]
    fn test_produces_docx_package() {
        let result = MarkdownConverter::new()
            .convert_bytes(b"# Title\n\nBody\n", &ConvertOptions::default())
            .unwrap();
        assert_eq!(detect_format_from_bytes(&result.content).unwrap(), Format::Docx);
        assert_eq!(result.stats.block_count, 2);
        assert_eq!(result.mime_type, DOCX_MIME);
    }

    #[test]
    fn test_control_characters_reported() {
        let result = MarkdownConverter::new()
            .convert_bytes("colored \u{1b}[31mred\u{1b}[0m text\n".as_bytes(), &ConvertOptions::default())
            .unwrap();
        assert_eq!(result.warnings, vec![Warning::DroppedCharacters(2)]);

        let markdown = crate::docx_to_markdown(&result.content).unwrap();
        assert_eq!(markdown, "colored \\[31mred\\[0m text\n");
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let result = MarkdownConverter::new().convert_bytes(&[0xFF, 0xFE], &ConvertOptions::default());
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }
}

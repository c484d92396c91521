//! DOCX to Markdown converter.

use crate::docx::read_package;
use crate::error::Result;
use crate::extract::extract;
use crate::render::to_markdown;

use super::safety::hash_bytes;
use super::{ConvertOptions, ConvertResult, DocumentConverter};

/// DOCX document converter.
///
/// Produces Markdown with the formatting the text cannot carry recorded in
/// a trailing metadata comment.
#[derive(Debug, Clone, Default)]
pub struct DocxConverter {
    _private: (),
}

impl DocxConverter {
    /// Create a new DOCX converter.
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl DocumentConverter for DocxConverter {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn output_extension(&self) -> &str {
        "md"
    }

    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult> {
        let native = read_package(bytes)?;
        let (doc, warnings) = extract(&native)?;

        let mut render = options.render.clone();
        if render.source_hash.is_none() {
            render = render.with_source_hash(hash_bytes(bytes));
        }
        let content = to_markdown(&doc, &render)?;

        Ok(ConvertResult::new(content.into_bytes(), doc, warnings).with_mime_type("text/markdown"))
    }
}

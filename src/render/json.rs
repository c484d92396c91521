//! JSON dump of blocks and metadata.

use crate::error::{Error, Result};
use crate::model::Document;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a document to JSON.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, InlineSpan, ListMeta, Metadata, Properties};

    fn sample() -> Document {
        let mut metadata = Metadata::new();
        metadata.set_list(1, ListMeta::ordered(0, Some(1)));
        let mut properties = Properties::default();
        properties.title = Some("Test".to_string());
        Document::from_parts(
            vec![
                Block::heading(1, vec![InlineSpan::plain("Hello")]),
                Block::list_item(vec![InlineSpan::plain("first")]),
            ],
            metadata,
            properties,
        )
        .unwrap()
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\""));
        assert!(json.contains("Hello"));
        assert!(json.contains('\n')); // Pretty has newlines
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n')); // Compact has no newlines
        assert!(json.contains("start_index"));
    }

    #[test]
    fn test_json_parses_back() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        let doc: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.metadata().list(1).and_then(|l| l.start_index), Some(1));
    }
}

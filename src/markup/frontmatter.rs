//! Leading YAML front matter and the trailing metadata comment.
//!
//! Both are split off the text before block parsing, so neither ever
//! appears in the block stream.
//!
//! ```text
//! ---
//! title: "Quarterly report"
//! font_name: Arial
//! ---
//! ...body...
//! <!-- DOCMARK_METADATA
//! {"version":1,"block_count":12,...}
//! -->
//! ```

use crate::error::{Error, Result};
use crate::model::{Metadata, Properties};
use crate::style::is_style_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker opening the trailing metadata comment.
pub const TRAILER_TAG: &str = "DOCMARK_METADATA";

/// Current trailer format version.
pub const TRAILER_VERSION: u32 = 1;

const PROPERTY_KEYS: &[&str] = &[
    "title", "author", "subject", "keywords", "created", "modified",
];

/// Parsed front matter: document properties and style overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Title, author, subject and keywords
    pub properties: Properties,

    /// Remaining keys, to be merged over the style configuration
    pub style_overrides: Map<String, Value>,
}

/// Split a leading `---` block off the text.
///
/// Returns the raw YAML and the remaining body, or `None` when the text does
/// not start with a closed front matter block.
pub fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---\n")?;
    if let Some(end) = rest.find("\n---\n") {
        return Some((&rest[..end], &rest[end + 5..]));
    }
    if let Some(yaml) = rest.strip_suffix("\n---") {
        return Some((yaml, ""));
    }
    // An empty block: "---\n---\n"
    if let Some(body) = rest.strip_prefix("---\n") {
        return Some(("", body));
    }
    None
}

/// Parse front matter YAML.
///
/// Returns `Ok(None)` unless the YAML is a non-empty mapping whose keys are
/// all document properties or [`StyleConfig`](crate::style::StyleConfig)
/// fields. In that case the block is ordinary text.
pub fn parse_front_matter(yaml: &str) -> Result<Option<FrontMatter>> {
    let parsed: serde_yaml::Value = serde_yaml::from_str(yaml)
        .map_err(|e| Error::MalformedInput(format!("front matter: {}", e)))?;
    let value = serde_json::to_value(parsed)
        .map_err(|e| Error::MalformedInput(format!("front matter: {}", e)))?;

    let mut map = match value {
        Value::Object(map) if !map.is_empty() => map,
        _ => return Ok(None),
    };
    if let Some(key) = map.keys().find(|key| !is_front_matter_key(key)) {
        log::debug!("not front matter: unknown key {:?}", key);
        return Ok(None);
    }

    let mut properties = Properties::default();
    for key in PROPERTY_KEYS {
        let Some(value) = map.remove(*key) else {
            continue;
        };
        let text = match value {
            Value::String(s) => s,
            Value::Array(items) => items
                .iter()
                .map(value_to_text)
                .collect::<Vec<_>>()
                .join(", "),
            other => value_to_text(&other),
        };
        match *key {
            "title" => properties.title = Some(text),
            "author" => properties.author = Some(text),
            "subject" => properties.subject = Some(text),
            "keywords" => properties.keywords = Some(text),
            "created" => properties.created = parse_date(&text),
            _ => properties.modified = parse_date(&text),
        }
    }

    Ok(Some(FrontMatter {
        properties,
        style_overrides: map,
    }))
}

fn is_front_matter_key(key: &str) -> bool {
    PROPERTY_KEYS.contains(&key) || is_style_key(key)
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| log::warn!("ignoring front matter date {:?}: {}", text, e))
        .ok()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render front matter carrying document properties.
pub fn render_front_matter(properties: &Properties) -> String {
    properties.to_yaml_frontmatter()
}

/// Record stored at the end of generated Markdown.
///
/// Only attributes the Markdown cannot express itself (paragraph
/// alignment) are kept; everything else is re-derived on parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataTrailer {
    /// Trailer format version
    pub version: u32,

    /// Number of blocks the metadata was recorded against
    pub block_count: usize,

    /// SHA-256 of the source document, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,

    /// When the conversion ran
    pub converted_at: DateTime<Utc>,

    /// Alignment entries keyed by block index
    pub metadata: Metadata,
}

impl MetadataTrailer {
    /// Build a trailer for the given block count and metadata.
    pub fn new(block_count: usize, metadata: &Metadata) -> Self {
        Self {
            version: TRAILER_VERSION,
            block_count,
            source_hash: None,
            converted_at: Utc::now(),
            metadata: metadata.alignments_only(),
        }
    }

    /// Record the source document hash.
    pub fn with_source_hash(mut self, hash: impl Into<String>) -> Self {
        self.source_hash = Some(hash.into());
        self
    }

    /// Render as an HTML comment.
    pub fn render(&self) -> Result<String> {
        let json = serde_json::to_string(self).map_err(|e| Error::Render(e.to_string()))?;
        Ok(format!("<!-- {}\n{}\n-->\n", TRAILER_TAG, json))
    }
}

/// Split a trailing metadata comment off the text.
///
/// Returns the body without the trailer and the raw JSON, if present.
pub fn split_trailer(text: &str) -> (&str, Option<&str>) {
    let trimmed = text.trim_end();
    let opener = format!("<!-- {}", TRAILER_TAG);
    let Some(start) = trimmed.rfind(&opener) else {
        return (text, None);
    };
    let Some(inner) = trimmed[start + opener.len()..].strip_suffix("-->") else {
        return (text, None);
    };
    // The trailer must start on its own line.
    if start > 0 && !trimmed[..start].ends_with('\n') {
        return (text, None);
    }
    (&trimmed[..start], Some(inner.trim()))
}

/// Parse the JSON of a trailer.
pub fn parse_trailer(json: &str) -> Result<MetadataTrailer> {
    serde_json::from_str(json).map_err(|e| Error::MalformedInput(format!("metadata trailer: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Alignment;

    #[test]
    fn test_split_front_matter() {
        let (yaml, body) = split_front_matter("---\ntitle: x\n---\n# Body\n").unwrap();
        assert_eq!(yaml, "title: x");
        assert_eq!(body, "# Body\n");

        let (yaml, body) = split_front_matter("---\nfont_size: 12\n---").unwrap();
        assert_eq!(yaml, "font_size: 12");
        assert_eq!(body, "");

        assert!(split_front_matter("# No front matter\n---\n").is_none());
        assert!(split_front_matter("---\nnever closed\n").is_none());
    }

    #[test]
    fn test_parse_front_matter_splits_keys() {
        let fm = parse_front_matter("title: Report\nkeywords: [a, b]\nfont_name: Arial\n")
            .unwrap()
            .unwrap();
        assert_eq!(fm.properties.title.as_deref(), Some("Report"));
        assert_eq!(fm.properties.keywords.as_deref(), Some("a, b"));
        assert_eq!(fm.style_overrides.get("font_name"), Some(&Value::from("Arial")));
        assert!(!fm.style_overrides.contains_key("title"));
    }

    #[test]
    fn test_rendered_properties_parse_back() {
        let properties = Properties {
            title: Some("Plan \"B\"".into()),
            created: Some(Utc::now()),
            ..Default::default()
        };
        let rendered = render_front_matter(&properties);
        let (yaml, _) = split_front_matter(&rendered).unwrap();
        let fm = parse_front_matter(yaml).unwrap().unwrap();
        assert_eq!(fm.properties.title, properties.title);
        assert!(fm.properties.created.is_some());
        assert!(fm.style_overrides.is_empty());
    }

    #[test]
    fn test_non_mapping_is_not_front_matter() {
        assert_eq!(parse_front_matter("- just\n- a list\n").unwrap(), None);
        assert!(parse_front_matter("key: [unclosed").is_err());
    }

    #[test]
    fn test_empty_or_foreign_mapping_is_not_front_matter() {
        assert_eq!(parse_front_matter("").unwrap(), None);
        assert_eq!(parse_front_matter("# Title").unwrap(), None);
        assert_eq!(parse_front_matter("Note: read this").unwrap(), None);
        assert_eq!(parse_front_matter("title: x\nNote: y").unwrap(), None);
        assert!(parse_front_matter("title: x\nfont_name: Arial").unwrap().is_some());
    }

    #[test]
    fn test_trailer_render_and_split() {
        let mut metadata = Metadata::new();
        metadata.set_alignment(1, Alignment::Center);
        let trailer = MetadataTrailer::new(3, &metadata).with_source_hash("abc");

        let text = format!("# Title\n\nBody\n\n{}", trailer.render().unwrap());
        let (body, json) = split_trailer(&text);
        assert_eq!(body, "# Title\n\nBody\n\n");

        let parsed = parse_trailer(json.unwrap()).unwrap();
        assert_eq!(parsed.block_count, 3);
        assert_eq!(parsed.source_hash.as_deref(), Some("abc"));
        assert_eq!(parsed.metadata.alignment(1), Alignment::Center);
    }

    #[test]
    fn test_trailer_keeps_only_alignments() {
        let mut metadata = Metadata::new();
        metadata.set_list(0, crate::model::ListMeta::bullet(0));
        metadata.set_alignment(1, Alignment::Right);
        let trailer = MetadataTrailer::new(2, &metadata);
        assert_eq!(trailer.metadata.len(), 1);
    }

    #[test]
    fn test_no_trailer() {
        let (body, json) = split_trailer("plain text <!-- DOCMARK_METADATA {} -->");
        assert_eq!(body, "plain text <!-- DOCMARK_METADATA {} -->");
        assert!(json.is_none());
    }
}

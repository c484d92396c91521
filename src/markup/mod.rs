//! Markdown input: recognizers, block parser, inline parser, front matter.
//!
//! [`parse_markup`] is the entry point. It strips front matter and the
//! metadata trailer, parses the remaining body into blocks and merges the
//! front matter over the caller's style configuration.

pub mod frontmatter;
pub mod inline;
mod options;
pub mod parser;
pub mod recognize;

pub use frontmatter::{FrontMatter, MetadataTrailer, TRAILER_TAG};
pub use options::{ErrorMode, ParseOptions};
pub use parser::{parse_blocks, ParserState};

use crate::error::{Error, Result, Warning};
use crate::model::Document;
use crate::style::{merge_overrides, StyleConfig};
use serde_json::Value;

/// Result of parsing Markdown text.
#[derive(Debug, Clone)]
pub struct ParsedMarkup {
    /// Blocks, metadata and front-matter properties
    pub document: Document,

    /// Style configuration with front matter applied
    pub style: StyleConfig,

    /// Degradations recovered during parsing
    pub warnings: Vec<Warning>,
}

/// Parse Markdown text into a document.
pub fn parse_markup(text: &str, style: &StyleConfig, options: &ParseOptions) -> Result<ParsedMarkup> {
    let normalized = normalize(text);
    let mut warnings = Vec::new();
    let mut style = style.clone();
    let mut properties = Default::default();

    let mut body = normalized.as_str();
    if options.read_front_matter {
        if let Some((yaml, rest)) = frontmatter::split_front_matter(body) {
            match frontmatter::parse_front_matter(yaml) {
                Ok(Some(front)) => {
                    body = rest;
                    properties = front.properties;
                    if !front.style_overrides.is_empty() {
                        style = apply_overrides(&style, front.style_overrides, options, &mut warnings)?;
                    }
                }
                Ok(None) => {}
                Err(e) if options.error_mode == ErrorMode::Strict => return Err(e),
                Err(e) => log::warn!("treating front matter as text: {}", e),
            }
        }
    }
    warnings.extend(style.validate());

    let mut trailer_json = None;
    if options.read_trailer {
        let (rest, json) = frontmatter::split_trailer(body);
        body = rest;
        trailer_json = json;
    }

    let mut document = parser::parse_blocks(body, options)?;
    document.properties = properties;

    if let Some(json) = trailer_json {
        document = apply_trailer(document, json, options, &mut warnings)?;
    }

    Ok(ParsedMarkup {
        document,
        style,
        warnings,
    })
}

fn normalize(text: &str) -> String {
    text.strip_prefix('\u{feff}')
        .unwrap_or(text)
        .replace("\r\n", "\n")
}

fn apply_overrides(
    style: &StyleConfig,
    overrides: serde_json::Map<String, Value>,
    options: &ParseOptions,
    warnings: &mut Vec<Warning>,
) -> Result<StyleConfig> {
    match merge_overrides(style, Value::Object(overrides)) {
        Ok((merged, ignored)) => {
            warnings.extend(ignored);
            Ok(merged)
        }
        Err(e) if options.error_mode == ErrorMode::Strict => Err(e),
        Err(e) => {
            log::warn!("ignoring front matter style overrides: {}", e);
            warnings.push(Warning::ConfigFallback {
                field: "front matter".into(),
                value: e.to_string(),
            });
            Ok(style.clone())
        }
    }
}

fn apply_trailer(
    document: Document,
    json: &str,
    options: &ParseOptions,
    warnings: &mut Vec<Warning>,
) -> Result<Document> {
    let reason = match frontmatter::parse_trailer(json) {
        Ok(trailer) if trailer.block_count != document.len() => format!(
            "recorded for {} blocks, document has {}",
            trailer.block_count,
            document.len()
        ),
        Ok(trailer) => {
            let (blocks, metadata, properties) = document.into_parts();
            let mut merged = metadata.clone();
            merged.merge_alignments(&trailer.metadata);
            return match merged.validate(&blocks) {
                Ok(()) => Document::from_parts(blocks, merged, properties),
                Err(e) => {
                    stale(e.to_string(), options, warnings)?;
                    Document::from_parts(blocks, metadata, properties)
                }
            };
        }
        Err(e) => e.to_string(),
    };

    stale(reason, options, warnings)?;
    Ok(document)
}

fn stale(reason: String, options: &ParseOptions, warnings: &mut Vec<Warning>) -> Result<()> {
    if options.error_mode == ErrorMode::Strict {
        return Err(Error::MalformedInput(format!("stale metadata trailer: {}", reason)));
    }
    log::warn!("ignoring metadata trailer: {}", reason);
    warnings.push(Warning::StaleMetadata(reason));
    Ok(())
}

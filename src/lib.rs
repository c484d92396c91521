//! # docmark
//!
//! Bidirectional conversion between DOCX packages and Markdown.
//!
//! Both directions pass through the same intermediate form: an ordered
//! sequence of [`Block`]s plus [`Metadata`] keyed by block index. Markdown
//! generated from a DOCX file carries a trailing comment with the formatting
//! the text itself cannot express, so converting it back restores it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docmark::{docx_to_markdown, markdown_to_docx, StyleConfig};
//!
//! fn main() -> docmark::Result<()> {
//!     let docx = markdown_to_docx("# Report\n\n- first\n- second\n", &StyleConfig::default())?;
//!     std::fs::write("report.docx", &docx)?;
//!
//!     let markdown = docx_to_markdown(&std::fs::read("report.docx")?)?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Block recognition**: headings, lists, tables, code, quotes, rules and
//!   ASCII header boxes
//! - **Style configuration**: fonts, heading colors and spacing from JSON,
//!   YAML, TOML or front matter
//! - **Round-trip metadata**: alignment survives DOCX → Markdown → DOCX
//! - **File safety**: hashing, collision detection, backups, atomic writes
//! - **Batch mode**: parallel conversion with Rayon

pub mod convert;
pub mod detect;
pub mod docx;
pub mod error;
pub mod extract;
pub mod markup;
pub mod model;
pub mod render;
pub mod style;

// Re-export commonly used types
pub use convert::{
    convert_batch, ConversionReport, ConvertOptions, ConvertResult, ConverterRegistry, Direction,
    DocumentConverter, FileSafety, SafetyConfig,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, Format};
pub use docx::NativeDocument;
pub use error::{Error, Result, Warning};
pub use markup::{ErrorMode, ParseOptions};
pub use model::{
    Alignment, Block, BlockKind, Document, Emphasis, InlineSpan, LinkMeta, ListMeta, Metadata,
    Properties, TableMeta,
};
pub use render::{ConversionStats, JsonFormat, RenderOptions};
pub use style::{
    load_style_config, load_style_config_with_warnings, write_sample_config, StyleConfig,
};

use std::path::Path;

/// Parse Markdown and lay it out as a native document.
///
/// # Example
///
/// ```
/// use docmark::{markup_to_native, StyleConfig};
///
/// let native = markup_to_native("# Title\n\nBody", &StyleConfig::default()).unwrap();
/// assert_eq!(native.body.len(), 2);
/// ```
pub fn markup_to_native(markup: &str, style: &StyleConfig) -> Result<NativeDocument> {
    let parsed = markup::parse_markup(markup, style, &ParseOptions::default())?;
    render::render_native(&parsed.document, &parsed.style)
}

/// Extract the blocks of a native document and render them as Markdown.
pub fn native_to_markup(native: &NativeDocument) -> Result<String> {
    let (doc, _warnings) = extract::extract(native)?;
    render::to_markdown(&doc, &RenderOptions::default())
}

/// Convert Markdown text to a DOCX package.
pub fn markdown_to_docx(markdown: &str, style: &StyleConfig) -> Result<Vec<u8>> {
    let native = markup_to_native(markdown, style)?;
    docx::write_package(&native)
}

/// Convert a DOCX package to Markdown.
///
/// # Example
///
/// ```no_run
/// use docmark::docx_to_markdown;
///
/// let markdown = docx_to_markdown(&std::fs::read("report.docx").unwrap()).unwrap();
/// std::fs::write("report.md", markdown).unwrap();
/// ```
pub fn docx_to_markdown(data: &[u8]) -> Result<String> {
    let native = docx::read_package(data)?;
    native_to_markup(&native)
}

/// Convert Markdown to DOCX, keeping warnings and statistics.
pub fn markdown_to_docx_report(markdown: &str, options: &ConvertOptions) -> Result<ConvertResult> {
    convert::MarkdownConverter::new().convert_bytes(markdown.as_bytes(), options)
}

/// Convert DOCX to Markdown, keeping warnings and statistics.
pub fn docx_to_markdown_report(data: &[u8], options: &ConvertOptions) -> Result<ConvertResult> {
    convert::DocxConverter::new().convert_bytes(data, options)
}

/// Convert a file on disk, picking the direction from the input.
///
/// # Example
///
/// ```no_run
/// use docmark::{convert_file, ConvertOptions, FileSafety, SafetyConfig};
///
/// let safety = FileSafety::new(SafetyConfig::new().forced());
/// let report = convert_file("notes.md", "notes.docx", &ConvertOptions::default(), &safety).unwrap();
/// println!("wrote {} ({})", report.output.display(), report.output_hash);
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &ConvertOptions,
    safety: &FileSafety,
) -> Result<ConversionReport> {
    ConverterRegistry::with_defaults().convert_file(input.as_ref(), output.as_ref(), options, safety)
}

/// Builder for converting documents.
///
/// # Example
///
/// ```no_run
/// use docmark::Docmark;
///
/// let markdown = Docmark::new()
///     .with_frontmatter()
///     .open("report.docx")?
///     .to_markdown()?;
/// # Ok::<(), docmark::Error>(())
/// ```
pub struct Docmark {
    options: ConvertOptions,
}

impl Docmark {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            options: ConvertOptions::default(),
        }
    }

    /// Fail on malformed front matter or a stale trailer.
    pub fn strict(mut self) -> Self {
        self.options.parse = self.options.parse.strict();
        self
    }

    /// Use a style configuration.
    pub fn with_style(mut self, style: StyleConfig) -> Self {
        self.options.style = style;
        self
    }

    /// Load the style configuration from a file.
    pub fn with_config<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.options.style = load_style_config(path)?;
        Ok(self)
    }

    /// Enable front matter in Markdown output.
    pub fn with_frontmatter(mut self) -> Self {
        self.options.render = self.options.render.with_frontmatter(true);
        self
    }

    /// Leave the metadata trailer out of Markdown output.
    pub fn without_metadata(mut self) -> Self {
        self.options.render = self.options.render.with_metadata(false);
        self
    }

    /// Set the list indentation width for both directions.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.options.parse = self.options.parse.with_indent_width(width);
        self.options.render = self.options.render.with_indent_width(width);
        self
    }

    /// The accumulated conversion options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Read a DOCX or Markdown file into a document.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<DocmarkResult> {
        let data = std::fs::read(path)?;
        self.open_bytes(&data)
    }

    /// Read DOCX or Markdown content into a document.
    pub fn open_bytes(self, data: &[u8]) -> Result<DocmarkResult> {
        let format = detect_format_from_bytes(data)?;
        let (document, style, warnings) = match format {
            Format::Docx => {
                let native = docx::read_package(data)?;
                let (document, warnings) = extract::extract(&native)?;
                (document, self.options.style.clone(), warnings)
            }
            Format::Markdown => {
                let text = std::str::from_utf8(data)
                    .map_err(|e| Error::MalformedInput(e.to_string()))?;
                let parsed = markup::parse_markup(text, &self.options.style, &self.options.parse)?;
                (parsed.document, parsed.style, parsed.warnings)
            }
        };
        Ok(DocmarkResult {
            document,
            format,
            style,
            warnings,
            render_options: self.options.render,
        })
    }
}

impl Default for Docmark {
    fn default() -> Self {
        Self::new()
    }
}

/// A document read through [`Docmark`].
pub struct DocmarkResult {
    /// The intermediate document
    pub document: Document,
    /// Format the document was read from
    pub format: Format,
    style: StyleConfig,
    warnings: Vec<Warning>,
    render_options: RenderOptions,
}

impl DocmarkResult {
    /// Render as Markdown.
    pub fn to_markdown(&self) -> Result<String> {
        render::to_markdown(&self.document, &self.render_options)
    }

    /// Render as a DOCX package.
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        let native = render::render_native(&self.document, &self.style)?;
        docx::write_package(&native)
    }

    /// Dump blocks and metadata as JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Block statistics.
    pub fn stats(&self) -> ConversionStats {
        let mut stats = ConversionStats::from_document(&self.document);
        stats.warning_count = self.warnings.len() as u32;
        stats
    }

    /// Degradations recovered while reading.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docmark_builder() {
        let builder = Docmark::new()
            .strict()
            .with_frontmatter()
            .without_metadata()
            .with_indent_width(4);

        assert_eq!(builder.options.parse.error_mode, ErrorMode::Strict);
        assert!(builder.options.render.include_frontmatter);
        assert!(!builder.options.render.include_metadata);
        assert_eq!(builder.options.render.indent_width, 4);
        assert_eq!(builder.options.parse.indent_width, 4);
    }

    #[test]
    fn test_docx_to_markdown_rejects_text() {
        let result = docx_to_markdown(b"# not a package");
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_open_bytes_detects_format() {
        let result = Docmark::new().open_bytes(b"# Title\n\ntext\n").unwrap();
        assert_eq!(result.format, Format::Markdown);
        assert_eq!(result.stats().heading_count, 1);

        let docx = result.to_docx().unwrap();
        let back = Docmark::new().open_bytes(&docx).unwrap();
        assert_eq!(back.format, Format::Docx);
        assert_eq!(back.to_markdown().unwrap(), "# Title\n\ntext\n");
    }

    #[test]
    fn test_open_bytes_unknown_format() {
        let result = Docmark::new().open_bytes(&[0x00, 0x01, 0x02]);
        assert!(matches!(result, Err(Error::UnknownFormat(_))));
    }

    #[test]
    fn test_markup_native_round_trip() {
        let native = markup_to_native("## Section\n\n1. one\n2. two\n", &StyleConfig::default()).unwrap();
        assert_eq!(native_to_markup(&native).unwrap(), "## Section\n\n1. one\n2. two\n");
    }
}

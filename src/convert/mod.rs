//! Converter registry, file conversion and batch mode.
//!
//! Converters are keyed by input extension. Each one runs a complete
//! pipeline in memory; the file helpers then pass the output through
//! [`FileSafety`] before anything is written.
//!
//! # Example
//!
//! ```no_run
//! use docmark::convert::{ConverterRegistry, ConvertOptions, FileSafety, SafetyConfig};
//! use std::path::Path;
//!
//! fn main() -> docmark::Result<()> {
//!     let registry = ConverterRegistry::with_defaults();
//!     let safety = FileSafety::new(SafetyConfig::new().forced());
//!     let report = registry.convert_file(
//!         Path::new("report.docx"),
//!         Path::new("report.md"),
//!         &ConvertOptions::default(),
//!         &safety,
//!     )?;
//!     println!("{} blocks", report.stats.block_count);
//!     Ok(())
//! }
//! ```

mod docx;
mod markdown;
pub mod safety;

pub use docx::DocxConverter;
pub use markdown::MarkdownConverter;
pub use safety::{AutoConfirm, Confirm, FileSafety, SafetyConfig, WriteCheck};

use crate::detect::{detect_format_from_bytes, Format};
use crate::error::{Error, Result, Warning};
use crate::markup::ParseOptions;
use crate::model::Document;
use crate::render::{ConversionStats, RenderOptions};
use crate::style::StyleConfig;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Options for document conversion.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Markdown rendering options
    pub render: RenderOptions,

    /// Markdown parsing options
    pub parse: ParseOptions,

    /// Formatting applied to generated DOCX documents
    pub style: StyleConfig,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render = options;
        self
    }

    /// Set parsing options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    /// Set the style configuration.
    pub fn with_style(mut self, style: StyleConfig) -> Self {
        self.style = style;
        self
    }
}

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// DOCX in, Markdown out
    DocxToMarkdown,
    /// Markdown in, DOCX out
    MarkdownToDocx,
}

impl Direction {
    /// Direction implied by an input format.
    pub fn from_source(format: Format) -> Self {
        match format {
            Format::Docx => Direction::DocxToMarkdown,
            Format::Markdown => Direction::MarkdownToDocx,
        }
    }

    /// Direction implied by a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "docx" => Some(Direction::DocxToMarkdown),
            "md" | "markdown" => Some(Direction::MarkdownToDocx),
            _ => None,
        }
    }

    /// Name of the converter handling this direction.
    pub fn converter_name(&self) -> &'static str {
        match self {
            Direction::DocxToMarkdown => "docx",
            Direction::MarkdownToDocx => "markdown",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "docx2md" => Ok(Direction::DocxToMarkdown),
            "md2docx" => Ok(Direction::MarkdownToDocx),
            other => Err(Error::Other(format!(
                "unknown direction '{}', expected docx2md or md2docx",
                other
            ))),
        }
    }
}

/// Result of document conversion.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// Converted content: UTF-8 Markdown or a DOCX package
    pub content: Vec<u8>,

    /// The intermediate document both directions pass through
    pub document: Document,

    /// Degradations recovered during the conversion
    pub warnings: Vec<Warning>,

    /// Block statistics
    pub stats: ConversionStats,

    /// MIME type of the output
    pub mime_type: &'static str,
}

impl ConvertResult {
    /// Create a new conversion result.
    pub fn new(content: Vec<u8>, document: Document, warnings: Vec<Warning>) -> Self {
        let mut stats = ConversionStats::from_document(&document);
        stats.warning_count = warnings.len() as u32;
        Self {
            content,
            document,
            warnings,
            stats,
            mime_type: "text/markdown",
        }
    }

    /// Set MIME type.
    pub fn with_mime_type(mut self, mime_type: &'static str) -> Self {
        self.mime_type = mime_type;
        self
    }

    /// Get content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// The content as text, for Markdown output.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }
}

/// Outcome of converting one file on disk.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Source file
    pub input: PathBuf,

    /// Written file
    pub output: PathBuf,

    /// SHA-256 of the source file
    pub input_hash: String,

    /// SHA-256 of the written file
    pub output_hash: String,

    /// Backup of the previous output, if one was made
    pub backup: Option<PathBuf>,

    /// Degradations recovered during the conversion
    pub warnings: Vec<Warning>,

    /// Block statistics
    pub stats: ConversionStats,
}

/// Trait for document converters.
///
/// Implement this trait to add support for a new input format.
pub trait DocumentConverter: Send + Sync {
    /// Get the supported input extensions for this converter.
    ///
    /// Extensions should be lowercase without the leading dot (e.g., `["docx"]`).
    fn supported_extensions(&self) -> &[&str];

    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Extension of the files this converter produces.
    fn output_extension(&self) -> &str;

    /// Convert from bytes.
    fn convert_bytes(&self, bytes: &[u8], options: &ConvertOptions) -> Result<ConvertResult>;

    /// Convert a file at the given path.
    fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        let bytes = std::fs::read(path)?;
        self.convert_bytes(&bytes, options)
    }

    /// Check if this converter supports the given extension.
    fn supports_extension(&self, ext: &str) -> bool {
        let ext_lower = ext.to_lowercase();
        self.supported_extensions().iter().any(|e| *e == ext_lower)
    }
}

/// Registry for document converters.
///
/// The registry maps file extensions to converters and provides
/// convenient methods for converting documents.
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn DocumentConverter>>,
    by_name: HashMap<String, Arc<dyn DocumentConverter>>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with both directions registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DocxConverter::new()));
        registry.register(Arc::new(MarkdownConverter::new()));
        registry
    }

    /// Register a converter.
    ///
    /// The converter will be registered for all its supported extensions.
    pub fn register(&mut self, converter: Arc<dyn DocumentConverter>) {
        for ext in converter.supported_extensions() {
            self.converters
                .insert(ext.to_lowercase(), converter.clone());
        }
        self.by_name
            .insert(converter.name().to_lowercase(), converter);
    }

    /// Get a converter by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.converters.get(&ext.to_lowercase()).cloned()
    }

    /// Get a converter by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn DocumentConverter>> {
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// Get the converter for a direction.
    pub fn get_by_direction(&self, direction: Direction) -> Option<Arc<dyn DocumentConverter>> {
        self.get_by_name(direction.converter_name())
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.converters.contains_key(&ext.to_lowercase())
    }

    /// Get all supported extensions.
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.converters.keys().map(|s| s.as_str()).collect()
    }

    /// Pick the converter for a path: by extension, then by content.
    pub fn resolve(&self, path: &Path) -> Result<Arc<dyn DocumentConverter>> {
        if let Some(converter) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| self.get_by_extension(ext))
        {
            return Ok(converter);
        }
        let format = detect_format_from_bytes(&std::fs::read(path)?)?;
        self.get_by_direction(Direction::from_source(format))
            .ok_or_else(|| Error::NoConverter(format.extension().to_string()))
    }

    /// Convert a file using the appropriate converter.
    pub fn convert(&self, path: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
        self.resolve(path)?.convert(path, options)
    }

    /// Convert bytes using the specified extension to determine the converter.
    pub fn convert_bytes(
        &self,
        bytes: &[u8],
        ext: &str,
        options: &ConvertOptions,
    ) -> Result<ConvertResult> {
        let converter = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::NoConverter(ext.to_string()))?;

        converter.convert_bytes(bytes, options)
    }

    /// Convert `input` and write the result to `output` through the safety layer.
    pub fn convert_file(
        &self,
        input: &Path,
        output: &Path,
        options: &ConvertOptions,
        safety: &FileSafety,
    ) -> Result<ConversionReport> {
        let converter = self.resolve(input)?;
        convert_with(converter.as_ref(), input, output, options, safety)
    }

    /// Convert `input` in an explicit direction.
    pub fn convert_file_as(
        &self,
        direction: Direction,
        input: &Path,
        output: &Path,
        options: &ConvertOptions,
        safety: &FileSafety,
    ) -> Result<ConversionReport> {
        let converter = self
            .get_by_direction(direction)
            .ok_or_else(|| Error::NoConverter(direction.converter_name().to_string()))?;
        convert_with(converter.as_ref(), input, output, options, safety)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn convert_with(
    converter: &dyn DocumentConverter,
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
    safety: &FileSafety,
) -> Result<ConversionReport> {
    let bytes = std::fs::read(input)?;
    let input_hash = safety::hash_bytes(&bytes);
    let result = converter.convert_bytes(&bytes, options)?;

    // Output is complete in memory before the target is touched.
    let check = safety.check_write(input, output)?;
    safety.write_atomic(output, &result.content)?;
    log::debug!(
        "converted {} to {} with {}",
        input.display(),
        output.display(),
        converter.name()
    );

    Ok(ConversionReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        input_hash,
        output_hash: safety::hash_bytes(&result.content),
        backup: check.backup,
        warnings: result.warnings,
        stats: result.stats,
    })
}

/// Output path for `input` inside `out_dir`, with the converter's extension.
pub fn batch_output_path(input: &Path, out_dir: &Path, extension: &str) -> PathBuf {
    let mut name = input.file_stem().unwrap_or(input.as_os_str()).to_os_string();
    name.push(".");
    name.push(extension);
    out_dir.join(name)
}

/// Convert many files in parallel, one independent pipeline per file.
///
/// `on_done` is called once per input as it finishes, from worker threads.
/// Results are returned in input order.
pub fn convert_batch<F>(
    registry: &ConverterRegistry,
    inputs: &[PathBuf],
    out_dir: &Path,
    options: &ConvertOptions,
    safety: &FileSafety,
    on_done: F,
) -> Vec<(PathBuf, Result<ConversionReport>)>
where
    F: Fn(&Path) + Sync,
{
    inputs
        .par_iter()
        .map(|input| {
            let result = registry.resolve(input).and_then(|converter| {
                let output = batch_output_path(input, out_dir, converter.output_extension());
                convert_with(converter.as_ref(), input, &output, options, safety)
            });
            if let Err(e) = &result {
                log::warn!("{}: {}", input.display(), e);
            }
            on_done(input);
            (input.clone(), result)
        })
        .collect()
}

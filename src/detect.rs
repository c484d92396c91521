//! Input format detection.

use crate::error::{Error, Result};
use std::io::Cursor;
use std::path::Path;

/// Detected input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// OOXML word-processing package
    Docx,
    /// UTF-8 Markdown text
    Markdown,
}

impl Format {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Docx => "docx",
            Format::Markdown => "md",
        }
    }

    /// The format a conversion from this one produces.
    pub fn counterpart(&self) -> Format {
        match self {
            Format::Docx => Format::Markdown,
            Format::Markdown => Format::Docx,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Docx => write!(f, "DOCX"),
            Format::Markdown => write!(f, "Markdown"),
        }
    }
}

/// ZIP local file header: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Main document part every DOCX package carries.
const DOCUMENT_PART: &str = "word/document.xml";

/// Detect the format of a file.
///
/// # Example
/// ```no_run
/// use docmark::detect::{detect_format_from_path, Format};
///
/// let format = detect_format_from_path("notes.md").unwrap();
/// assert_eq!(format, Format::Markdown);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<Format> {
    let data = std::fs::read(path)?;
    detect_format_from_bytes(&data)
}

/// Detect the format of in-memory content.
///
/// # Returns
/// * `Ok(Format::Docx)` for a ZIP archive holding `word/document.xml`
/// * `Ok(Format::Markdown)` for UTF-8 text without NUL bytes
/// * `Err(Error::UnknownFormat)` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<Format> {
    if data.starts_with(ZIP_MAGIC) {
        let archive = zip::ZipArchive::new(Cursor::new(data))
            .map_err(|e| Error::UnknownFormat(format!("unreadable ZIP archive: {}", e)))?;
        if archive.file_names().any(|name| name == DOCUMENT_PART) {
            return Ok(Format::Docx);
        }
        return Err(Error::UnknownFormat(format!(
            "ZIP archive without {}",
            DOCUMENT_PART
        )));
    }

    match std::str::from_utf8(data) {
        Ok(text) if !text.contains('\0') => Ok(Format::Markdown),
        _ => Err(Error::UnknownFormat("binary data that is not a DOCX package".into())),
    }
}

/// Check if a file is a DOCX package.
pub fn is_docx<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_format_from_path(path), Ok(Format::Docx))
}

/// Check if bytes are a DOCX package.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(Format::Docx))
}

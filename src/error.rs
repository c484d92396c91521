//! Error types for docmark library.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for docmark operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a DOCX package nor Markdown text.
    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    /// The input could not be parsed into any block.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Error reading or writing the DOCX container.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Error parsing or producing package XML.
    #[error("XML error: {0}")]
    Xml(String),

    /// A style configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A metadata entry references a missing block or one of the wrong kind.
    #[error("Invalid metadata at block {index}: {reason}")]
    InvalidMetadata {
        /// Block index the entry points to
        index: usize,
        /// What is wrong with it
        reason: String,
    },

    /// Error during rendering (DOCX, Markdown, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// The file safety layer refused to write the output.
    #[error("Refusing to write {path}: {reason}")]
    Safety {
        /// Output path
        path: String,
        /// Why the write was refused
        reason: String,
    },

    /// No converter is registered for the input.
    #[error("No converter for extension: {0}")]
    NoConverter(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            zip::result::ZipError::InvalidArchive(msg) => {
                Error::MalformedInput(format!("not a DOCX package: {}", msg))
            }
            zip::result::ZipError::FileNotFound => {
                Error::MalformedInput("missing part in DOCX package".into())
            }
            _ => Error::Archive(err.to_string()),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(format!("YAML: {}", err))
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(format!("TOML: {}", err))
    }
}

/// Non-fatal degradation recorded during a conversion.
///
/// Warnings never abort a conversion; callers may display them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Warning {
    /// A native construct that has no block equivalent was skipped.
    UnsupportedElement(String),

    /// A style configuration field was out of range and replaced by its default.
    ConfigFallback {
        /// Field name
        field: String,
        /// Rejected value
        value: String,
    },

    /// A metadata trailer did not match the document it was attached to.
    StaleMetadata(String),

    /// Characters XML 1.0 cannot store were dropped from the output.
    DroppedCharacters(usize),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnsupportedElement(what) => write!(f, "skipped unsupported element: {}", what),
            Warning::ConfigFallback { field, value } => {
                write!(f, "invalid value {:?} for {}, using default", value, field)
            }
            Warning::StaleMetadata(reason) => write!(f, "ignored stale metadata: {}", reason),
            Warning::DroppedCharacters(count) => {
                write!(f, "dropped {} control characters not allowed in DOCX", count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MalformedInput("missing word/document.xml".into());
        assert_eq!(err.to_string(), "Malformed input: missing word/document.xml");

        let err = Error::InvalidMetadata {
            index: 4,
            reason: "expected list item".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid metadata at block 4: expected list item"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_zip_error_conversion() {
        let err: Error = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::ConfigFallback {
            field: "heading_colors.2".into(),
            value: "blue-ish".into(),
        };
        assert_eq!(
            w.to_string(),
            "invalid value \"blue-ish\" for heading_colors.2, using default"
        );
    }
}

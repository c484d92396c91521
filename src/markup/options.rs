//! Parsing options for Markdown input.

/// Options for parsing Markdown text.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Spaces per list nesting level; a tab counts as one level
    pub indent_width: usize,

    /// How malformed front matter and stale trailers are handled
    pub error_mode: ErrorMode,

    /// Split off and apply a leading YAML front matter block
    pub read_front_matter: bool,

    /// Split off and apply a trailing metadata comment
    pub read_trailer: bool,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the list indentation unit. Values below 1 are treated as 1.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width.max(1);
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail on malformed front matter or a stale trailer.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Enable or disable front matter handling.
    pub fn with_front_matter(mut self, read: bool) -> Self {
        self.read_front_matter = read;
        self
    }

    /// Enable or disable trailer handling.
    pub fn with_trailer(mut self, read: bool) -> Self {
        self.read_trailer = read;
        self
    }

    /// Indentation unit, never zero.
    pub fn indent_unit(&self) -> usize {
        self.indent_width.max(1)
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            error_mode: ErrorMode::Lenient,
            read_front_matter: true,
            read_trailer: true,
        }
    }
}

/// Error handling mode during parsing.
///
/// Block parsing itself never fails; the mode only decides what happens to
/// a front matter block or trailer that cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail with an error
    Strict,
    /// Log a warning, treat the block as text or ignore it, and continue
    #[default]
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_indent_width(4)
            .strict()
            .with_trailer(false);

        assert_eq!(options.indent_width, 4);
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.read_front_matter);
        assert!(!options.read_trailer);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.indent_width, 2);
        assert_eq!(options.error_mode, ErrorMode::Lenient);
    }

    #[test]
    fn test_zero_indent_width() {
        let mut options = ParseOptions::new().with_indent_width(0);
        assert_eq!(options.indent_width, 1);
        options.indent_width = 0;
        assert_eq!(options.indent_unit(), 1);
    }
}

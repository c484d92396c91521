//! Markdown rendering options.

/// Options for rendering Markdown.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Spaces of indentation per list level
    pub indent_width: usize,

    /// Character to use for unordered list markers
    pub list_marker: char,

    /// Include YAML front matter with document properties
    pub include_frontmatter: bool,

    /// Append the metadata trailer when there is something to record
    pub include_metadata: bool,

    /// Escape special Markdown characters
    pub escape_special_chars: bool,

    /// SHA-256 of the source document, recorded in the trailer
    pub source_hash: Option<String>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the list indentation width. Zero is treated as one.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width.max(1);
        self
    }

    /// Set the list marker character.
    pub fn with_list_marker(mut self, marker: char) -> Self {
        self.list_marker = marker;
        self
    }

    /// Enable or disable front matter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Enable or disable the metadata trailer.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    /// Enable or disable escaping.
    pub fn with_escaping(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Record the source hash in the trailer.
    pub fn with_source_hash(mut self, hash: impl Into<String>) -> Self {
        self.source_hash = Some(hash.into());
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            list_marker: '-',
            include_frontmatter: false,
            include_metadata: true,
            escape_special_chars: true,
            source_hash: None,
        }
    }
}

//! Block and inline-level types.

use serde::{Deserialize, Serialize};

/// Structural kind of a [`Block`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    /// ATX, setext or styled heading
    Heading {
        /// Heading level (1-6)
        level: u8,
    },

    /// Plain paragraph
    Paragraph,

    /// One list item; nesting and numbering live in the metadata
    ListItem,

    /// One table row; cells are child blocks
    TableRow,

    /// Fenced code block
    CodeBlock {
        /// Info string after the opening fence
        language: Option<String>,
    },

    /// Quoted paragraph
    Blockquote,

    /// Thematic break
    HorizontalRule,

    /// Centered, bordered title box
    HeaderBox,

    /// Paragraph carrying at least one hyperlink
    Hyperlink,
}

impl BlockKind {
    /// Short lowercase name, used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Heading { .. } => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::ListItem => "list_item",
            BlockKind::TableRow => "table_row",
            BlockKind::CodeBlock { .. } => "code_block",
            BlockKind::Blockquote => "blockquote",
            BlockKind::HorizontalRule => "horizontal_rule",
            BlockKind::HeaderBox => "header_box",
            BlockKind::Hyperlink => "hyperlink",
        }
    }

    /// Whether blocks of this kind carry inline spans.
    pub fn has_spans(&self) -> bool {
        !matches!(
            self,
            BlockKind::TableRow | BlockKind::HorizontalRule | BlockKind::CodeBlock { .. }
        )
    }
}

/// One classified structural unit of a document.
///
/// Blocks are built in one step and only read afterwards; there are no
/// mutating accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    kind: BlockKind,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    text: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    spans: Vec<InlineSpan>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    cells: Vec<Block>,
}

impl Block {
    fn with_spans(kind: BlockKind, spans: Vec<InlineSpan>) -> Self {
        let spans: Vec<InlineSpan> = spans.into_iter().filter(|s| !s.text.is_empty()).collect();
        let text = spans.iter().map(|s| s.text.as_str()).collect();
        Self {
            kind,
            text,
            spans,
            cells: Vec::new(),
        }
    }

    /// Create a heading. The level is clamped to 1-6.
    pub fn heading(level: u8, spans: Vec<InlineSpan>) -> Self {
        Self::with_spans(
            BlockKind::Heading {
                level: level.clamp(1, 6),
            },
            spans,
        )
    }

    /// Create a plain paragraph.
    pub fn paragraph(spans: Vec<InlineSpan>) -> Self {
        Self::with_spans(BlockKind::Paragraph, spans)
    }

    /// Create a paragraph from unstyled text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::paragraph(vec![InlineSpan::plain(text)])
    }

    /// Create a list item.
    pub fn list_item(spans: Vec<InlineSpan>) -> Self {
        Self::with_spans(BlockKind::ListItem, spans)
    }

    /// Create a blockquote.
    pub fn blockquote(spans: Vec<InlineSpan>) -> Self {
        Self::with_spans(BlockKind::Blockquote, spans)
    }

    /// Create a link-bearing paragraph.
    pub fn hyperlink(spans: Vec<InlineSpan>) -> Self {
        Self::with_spans(BlockKind::Hyperlink, spans)
    }

    /// Create a header box. Lines of the display string are separated by `\n`.
    pub fn header_box(display: impl Into<String>) -> Self {
        let display = display.into();
        Self {
            kind: BlockKind::HeaderBox,
            spans: vec![InlineSpan::new(display.clone(), Emphasis::bold())],
            text: display,
            cells: Vec::new(),
        }
    }

    /// Create a horizontal rule.
    pub fn horizontal_rule() -> Self {
        Self {
            kind: BlockKind::HorizontalRule,
            text: String::new(),
            spans: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Create a code block from its literal body.
    pub fn code_block(language: Option<String>, text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::CodeBlock {
                language: language.filter(|l| !l.is_empty()),
            },
            text: text.into(),
            spans: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// Create a table row from its cells.
    pub fn table_row(cells: Vec<Block>) -> Self {
        Self {
            kind: BlockKind::TableRow,
            text: String::new(),
            spans: Vec::new(),
            cells,
        }
    }

    /// Block kind.
    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    /// Literal text. Empty for table rows and rules.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Inline spans in document order.
    pub fn spans(&self) -> &[InlineSpan] {
        &self.spans
    }

    /// Cells of a table row.
    pub fn cells(&self) -> &[Block] {
        &self.cells
    }

    /// Heading level, if this is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        match self.kind {
            BlockKind::Heading { level } => Some(level),
            _ => None,
        }
    }

    /// Whether this block is a table row.
    pub fn is_table_row(&self) -> bool {
        matches!(self.kind, BlockKind::TableRow)
    }

    /// Plain text, with table cells joined by tabs.
    pub fn plain_text(&self) -> String {
        if self.is_table_row() {
            self.cells
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join("\t")
        } else {
            self.text.clone()
        }
    }

    /// Check if the block has no text content.
    pub fn is_empty(&self) -> bool {
        match self.kind {
            BlockKind::HorizontalRule => false,
            BlockKind::TableRow => self.cells.iter().all(|c| c.text.trim().is_empty()),
            _ => self.text.trim().is_empty(),
        }
    }
}

/// A run of text with one set of emphasis flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSpan {
    /// The text content
    pub text: String,

    /// Emphasis flags
    #[serde(default, skip_serializing_if = "Emphasis::is_plain")]
    pub emphasis: Emphasis,
}

impl InlineSpan {
    /// Create a span.
    pub fn new(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            text: text.into(),
            emphasis,
        }
    }

    /// Create an unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Emphasis::default())
    }
}

/// Emphasis flags of an inline span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Emphasis {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Inline code (monospace)
    pub code: bool,

    /// Strikethrough text
    pub strikethrough: bool,

    /// Underlined text
    pub underline: bool,

    /// Superscript
    pub superscript: bool,

    /// Subscript
    pub subscript: bool,
}

impl Emphasis {
    /// Bold only.
    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Default::default()
        }
    }

    /// Italic only.
    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Default::default()
        }
    }

    /// Inline code only.
    pub fn code() -> Self {
        Self {
            code: true,
            ..Default::default()
        }
    }

    /// Check if no flag is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

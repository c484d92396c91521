//! Rendering result with statistics.

use crate::model::{BlockKind, Document, Properties};
use serde::{Deserialize, Serialize};

/// Result of rendering a document, including content and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResult {
    /// The rendered Markdown
    pub content: String,

    /// Document properties (copied from the source document)
    pub properties: Properties,

    /// Conversion statistics
    pub stats: ConversionStats,
}

impl RenderResult {
    /// Create a new render result.
    pub fn new(content: String, properties: Properties, stats: ConversionStats) -> Self {
        Self {
            content,
            properties,
            stats,
        }
    }

    /// Get the content length in bytes.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}

/// Block statistics of a converted document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Total number of blocks
    pub block_count: u32,

    /// Number of headings
    pub heading_count: u32,

    /// Number of paragraphs, including link-bearing ones
    pub paragraph_count: u32,

    /// Number of list items
    pub list_item_count: u32,

    /// Number of tables
    pub table_count: u32,

    /// Number of table rows
    pub table_row_count: u32,

    /// Number of code blocks
    pub code_block_count: u32,

    /// Number of blockquotes
    pub blockquote_count: u32,

    /// Number of horizontal rules
    pub horizontal_rule_count: u32,

    /// Number of header boxes
    pub header_box_count: u32,

    /// Number of hyperlink targets
    pub link_count: u32,

    /// Approximate word count (whitespace-separated tokens)
    pub word_count: u32,

    /// Character count (excluding whitespace)
    pub char_count: u32,

    /// Number of warnings raised during the conversion
    pub warning_count: u32,
}

impl ConversionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count the blocks of a document and the words of its text.
    pub fn from_document(doc: &Document) -> Self {
        let mut stats = Self::new();
        let mut last_table = None;
        for (index, block) in doc.blocks().iter().enumerate() {
            stats.block_count += 1;
            match block.kind() {
                BlockKind::Heading { .. } => stats.heading_count += 1,
                BlockKind::Paragraph | BlockKind::Hyperlink => stats.paragraph_count += 1,
                BlockKind::ListItem => stats.list_item_count += 1,
                BlockKind::TableRow => {
                    stats.table_row_count += 1;
                    let table = doc.metadata().table(index).map(|t| t.table);
                    if table.is_none() || table != last_table {
                        stats.table_count += 1;
                    }
                    last_table = table;
                    stats.link_count += doc.metadata().links(index).len() as u32;
                    continue;
                }
                BlockKind::CodeBlock { .. } => stats.code_block_count += 1,
                BlockKind::Blockquote => stats.blockquote_count += 1,
                BlockKind::HorizontalRule => stats.horizontal_rule_count += 1,
                BlockKind::HeaderBox => stats.header_box_count += 1,
            }
            last_table = None;
            stats.link_count += doc.metadata().links(index).len() as u32;
        }
        stats.count_text(&doc.plain_text());
        stats
    }

    /// Add word and character counts from text.
    pub fn count_text(&mut self, text: &str) {
        // Word count: whitespace-separated tokens
        self.word_count += text.split_whitespace().count() as u32;

        // Character count: non-whitespace characters
        self.char_count += text.chars().filter(|c| !c.is_whitespace()).count() as u32;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ConversionStats) {
        self.block_count += other.block_count;
        self.heading_count += other.heading_count;
        self.paragraph_count += other.paragraph_count;
        self.list_item_count += other.list_item_count;
        self.table_count += other.table_count;
        self.table_row_count += other.table_row_count;
        self.code_block_count += other.code_block_count;
        self.blockquote_count += other.blockquote_count;
        self.horizontal_rule_count += other.horizontal_rule_count;
        self.header_box_count += other.header_box_count;
        self.link_count += other.link_count;
        self.word_count += other.word_count;
        self.char_count += other.char_count;
        self.warning_count += other.warning_count;
    }
}

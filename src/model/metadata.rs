//! Side-channel formatting metadata keyed by block index.
//!
//! Entries carry only attributes that block text cannot express: list
//! nesting, table geometry, link targets and alignment. Text is never
//! repeated here.

use super::{Alignment, Block, BlockKind};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// List attributes of a list item block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    /// Nesting level (0 = top level)
    pub level: u8,

    /// Numbered rather than bulleted
    pub ordered: bool,

    /// First number of an ordered sequence; set on the sequence's first item only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
}

impl ListMeta {
    /// Bulleted item at the given level.
    pub fn bullet(level: u8) -> Self {
        Self {
            level,
            ordered: false,
            start_index: None,
        }
    }

    /// Numbered item at the given level.
    pub fn ordered(level: u8, start_index: Option<u32>) -> Self {
        Self {
            level,
            ordered: true,
            start_index,
        }
    }
}

/// Table attributes of a table row block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Ordinal of the table this row belongs to
    pub table: usize,

    /// Column count of the whole table
    pub column_count: usize,

    /// Header row
    pub is_header: bool,

    /// Column alignments, recorded on header rows
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alignments: Vec<Alignment>,
}

/// A hyperlink target attached to one span of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMeta {
    /// Cell index, for links inside table rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<usize>,

    /// Span index within the block (or cell)
    pub span: usize,

    /// Link target
    pub url: String,
}

/// Formatting metadata for a block sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    lists: BTreeMap<usize, ListMeta>,
    tables: BTreeMap<usize, TableMeta>,
    links: BTreeMap<usize, Vec<LinkMeta>>,
    alignments: BTreeMap<usize, Alignment>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record list attributes for a block.
    pub fn set_list(&mut self, index: usize, meta: ListMeta) {
        self.lists.insert(index, meta);
    }

    /// Record table attributes for a block.
    pub fn set_table(&mut self, index: usize, meta: TableMeta) {
        self.tables.insert(index, meta);
    }

    /// Attach a link target to a block.
    pub fn add_link(&mut self, index: usize, link: LinkMeta) {
        self.links.entry(index).or_default().push(link);
    }

    /// Record a non-default alignment for a block.
    pub fn set_alignment(&mut self, index: usize, alignment: Alignment) {
        if alignment == Alignment::Left {
            self.alignments.remove(&index);
        } else {
            self.alignments.insert(index, alignment);
        }
    }

    /// List attributes of a block.
    pub fn list(&self, index: usize) -> Option<&ListMeta> {
        self.lists.get(&index)
    }

    /// Table attributes of a block.
    pub fn table(&self, index: usize) -> Option<&TableMeta> {
        self.tables.get(&index)
    }

    /// Link targets of a block.
    pub fn links(&self, index: usize) -> &[LinkMeta] {
        self.links.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Link target of one span, outside tables.
    pub fn link_for_span(&self, index: usize, span: usize) -> Option<&str> {
        self.link_in(index, None, span)
    }

    /// Link target of one span, optionally inside a table cell.
    pub fn link_in(&self, index: usize, cell: Option<usize>, span: usize) -> Option<&str> {
        self.links(index)
            .iter()
            .find(|l| l.cell == cell && l.span == span)
            .map(|l| l.url.as_str())
    }

    /// Alignment of a block.
    pub fn alignment(&self, index: usize) -> Alignment {
        self.alignments.get(&index).copied().unwrap_or_default()
    }

    /// Number of entries of all kinds.
    pub fn len(&self) -> usize {
        self.lists.len()
            + self.tables.len()
            + self.links.values().map(Vec::len).sum::<usize>()
            + self.alignments.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Alignment entries only, for the markup trailer.
    pub fn alignments_only(&self) -> Self {
        Self {
            alignments: self.alignments.clone(),
            ..Default::default()
        }
    }

    /// Copy alignment entries from another metadata value.
    pub fn merge_alignments(&mut self, other: &Metadata) {
        self.alignments.extend(other.alignments.iter().map(|(k, v)| (*k, *v)));
    }

    /// Check that every entry references an existing block of a matching kind.
    ///
    /// A violation is a bug in whatever produced the metadata, so it is
    /// reported as [`Error::InvalidMetadata`] instead of being repaired.
    pub fn validate(&self, blocks: &[Block]) -> Result<()> {
        let block_at = |index: usize| {
            blocks.get(index).ok_or_else(|| Error::InvalidMetadata {
                index,
                reason: format!("only {} blocks exist", blocks.len()),
            })
        };

        for &index in self.lists.keys() {
            let block = block_at(index)?;
            if *block.kind() != BlockKind::ListItem {
                return Err(mismatch(index, "list item", block));
            }
        }

        for (&index, meta) in &self.tables {
            let block = block_at(index)?;
            if !block.is_table_row() {
                return Err(mismatch(index, "table row", block));
            }
            if block.cells().len() > meta.column_count {
                return Err(Error::InvalidMetadata {
                    index,
                    reason: format!(
                        "row has {} cells but table has {} columns",
                        block.cells().len(),
                        meta.column_count
                    ),
                });
            }
        }

        for (&index, links) in &self.links {
            let block = block_at(index)?;
            for link in links {
                let spans = match link.cell {
                    Some(cell) => block.cells().get(cell).map(Block::spans).ok_or_else(|| {
                        Error::InvalidMetadata {
                            index,
                            reason: format!("link references missing cell {}", cell),
                        }
                    })?,
                    None => block.spans(),
                };
                if link.span >= spans.len() {
                    return Err(Error::InvalidMetadata {
                        index,
                        reason: format!("link references missing span {}", link.span),
                    });
                }
            }
        }

        for &index in self.alignments.keys() {
            let block = block_at(index)?;
            if !block.kind().has_spans() {
                return Err(mismatch(index, "text block", block));
            }
        }

        Ok(())
    }
}

fn mismatch(index: usize, expected: &str, block: &Block) -> Error {
    Error::InvalidMetadata {
        index,
        reason: format!("expected {}, found {}", expected, block.kind().name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InlineSpan;

    fn sample_blocks() -> Vec<Block> {
        vec![
            Block::heading(1, vec![InlineSpan::plain("Title")]),
            Block::list_item(vec![InlineSpan::plain("item one")]),
            Block::table_row(vec![Block::plain("a"), Block::plain("b")]),
        ]
    }

    #[test]
    fn test_validate_ok() {
        let mut meta = Metadata::new();
        meta.set_list(1, ListMeta::bullet(0));
        meta.set_table(
            2,
            TableMeta {
                table: 0,
                column_count: 2,
                is_header: true,
                alignments: vec![],
            },
        );
        meta.set_alignment(0, Alignment::Center);
        assert!(meta.validate(&sample_blocks()).is_ok());
    }

    #[test]
    fn test_validate_dangling_index() {
        let mut meta = Metadata::new();
        meta.set_list(7, ListMeta::bullet(0));
        assert!(matches!(
            meta.validate(&sample_blocks()),
            Err(Error::InvalidMetadata { index: 7, .. })
        ));
    }

    #[test]
    fn test_validate_wrong_kind() {
        let mut meta = Metadata::new();
        meta.set_list(0, ListMeta::bullet(0));
        assert!(meta.validate(&sample_blocks()).is_err());
    }

    #[test]
    fn test_validate_link_span() {
        let mut meta = Metadata::new();
        meta.add_link(
            2,
            LinkMeta {
                cell: Some(1),
                span: 0,
                url: "https://example.com".into(),
            },
        );
        assert!(meta.validate(&sample_blocks()).is_ok());

        meta.add_link(
            2,
            LinkMeta {
                cell: Some(5),
                span: 0,
                url: "https://example.com".into(),
            },
        );
        assert!(meta.validate(&sample_blocks()).is_err());
    }

    #[test]
    fn test_list_meta_never_contains_text() {
        let mut meta = Metadata::new();
        meta.set_list(1, ListMeta::ordered(0, Some(1)));
        let json = serde_json::to_string(&meta).unwrap();
        assert!(!json.contains("item one"));
        assert!(json.contains("\"ordered\":true"));
    }

    #[test]
    fn test_left_alignment_not_stored() {
        let mut meta = Metadata::new();
        meta.set_alignment(0, Alignment::Left);
        assert!(meta.is_empty());
    }
}

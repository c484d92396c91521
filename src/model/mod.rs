//! Intermediate representation shared by both conversion directions.
//!
//! The Markdown parser and the DOCX extractor both produce a [`Document`]:
//! an ordered sequence of [`Block`]s plus side-channel [`Metadata`] keyed by
//! block index. Both renderers consume the same pair.

mod block;
mod document;
mod metadata;

pub use block::{Alignment, Block, BlockKind, Emphasis, InlineSpan};
pub use document::{Document, Properties};
pub use metadata::{LinkMeta, ListMeta, Metadata, TableMeta};

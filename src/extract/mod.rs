//! Native document to blocks: style classification and body walk.

pub mod classify;
mod extractor;

pub use classify::{classify_paragraph, style_category, Classified, StyleCategory};
pub use extractor::{extract, Extractor};

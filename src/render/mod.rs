//! Renderers: Markdown text, native DOCX structures and JSON dumps.

mod json;
mod markdown;
mod native;
mod options;
mod result;

pub use json::{to_json, JsonFormat};
pub use markdown::{to_markdown, to_markdown_with_stats, MarkdownRenderer};
pub use native::{render_native, NativeRenderer};
pub use options::RenderOptions;
pub use result::{ConversionStats, RenderResult};

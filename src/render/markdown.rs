//! Markdown rendering of blocks and metadata.

use crate::error::Result;
use crate::markup::MetadataTrailer;
use crate::model::{Alignment, Block, BlockKind, Document, Emphasis, InlineSpan, Metadata};
use unicode_width::UnicodeWidthStr;

use super::{ConversionStats, RenderOptions, RenderResult};

/// Narrowest header box border.
const MIN_BOX_WIDTH: usize = 10;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render(doc)
}

/// Convert a document to Markdown with statistics.
pub fn to_markdown_with_stats(doc: &Document, options: &RenderOptions) -> Result<RenderResult> {
    let renderer = MarkdownRenderer::new(options.clone());
    renderer.render_with_stats(doc)
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
    /// Running numbers of ordered items per list level
    counters: Vec<u32>,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            counters: Vec::new(),
        }
    }

    /// Render a document to Markdown.
    pub fn render(mut self, doc: &Document) -> Result<String> {
        self.render_internal(doc)
    }

    /// Render a document to Markdown with statistics.
    pub fn render_with_stats(mut self, doc: &Document) -> Result<RenderResult> {
        let content = self.render_internal(doc)?;
        let stats = ConversionStats::from_document(doc);
        Ok(RenderResult::new(content, doc.properties.clone(), stats))
    }

    fn render_internal(&mut self, doc: &Document) -> Result<String> {
        let mut output = String::new();

        let front_matter = self.options.include_frontmatter && !doc.properties.is_empty();
        if front_matter {
            output.push_str(&doc.properties.to_yaml_frontmatter());
            output.push('\n');
        }

        let blocks = doc.blocks();
        let meta = doc.metadata();
        let mut chunks: Vec<String> = Vec::new();
        let mut index = 0;
        while index < blocks.len() {
            let block = &blocks[index];
            match block.kind() {
                BlockKind::ListItem => {
                    let mut lines = Vec::new();
                    while index < blocks.len() && *blocks[index].kind() == BlockKind::ListItem {
                        lines.push(self.render_list_item(&blocks[index], meta, index));
                        index += 1;
                    }
                    self.counters.clear();
                    chunks.push(lines.join("\n"));
                    continue;
                }
                BlockKind::TableRow => {
                    let end = table_end(blocks, meta, index);
                    chunks.push(self.render_table(blocks, meta, index, end));
                    index = end;
                    continue;
                }
                _ => chunks.push(self.render_block(block, meta, index)),
            }
            index += 1;
        }
        // A leading `---` would open a front matter block on reparse.
        if !front_matter && blocks.first().is_some_and(|b| *b.kind() == BlockKind::HorizontalRule) {
            chunks[0] = "***".to_string();
        }
        output.push_str(&chunks.join("\n\n"));
        if !chunks.is_empty() {
            output.push('\n');
        }

        let alignments = meta.alignments_only();
        if self.options.include_metadata && !alignments.is_empty() {
            let mut trailer = MetadataTrailer::new(doc.len(), &alignments);
            if let Some(hash) = &self.options.source_hash {
                trailer = trailer.with_source_hash(hash.clone());
            }
            output.push('\n');
            output.push_str(&trailer.render()?);
        }

        Ok(output)
    }

    fn render_block(&self, block: &Block, meta: &Metadata, index: usize) -> String {
        match block.kind() {
            BlockKind::Heading { level } => format!(
                "{} {}",
                "#".repeat(usize::from(*level)),
                self.render_inline(block.spans(), meta, index, None)
            ),
            BlockKind::Paragraph | BlockKind::Hyperlink => {
                escape_leading_marker(&self.render_inline(block.spans(), meta, index, None))
            }
            BlockKind::Blockquote => format!(
                "> {}",
                self.render_inline(block.spans(), meta, index, None)
            ),
            BlockKind::HorizontalRule => "---".to_string(),
            BlockKind::HeaderBox => render_header_box(block.text()),
            BlockKind::CodeBlock { language } => render_code_block(block.text(), language.as_deref()),
            BlockKind::ListItem | BlockKind::TableRow => String::new(),
        }
    }

    fn render_list_item(&mut self, block: &Block, meta: &Metadata, index: usize) -> String {
        let list = meta.list(index).copied().unwrap_or_else(|| crate::model::ListMeta::bullet(0));
        let level = usize::from(list.level);
        let indent = " ".repeat(self.options.indent_width * level);

        let marker = if list.ordered {
            self.counters.resize(level + 1, 0);
            let number = match list.start_index {
                Some(start) => start,
                None => self.counters[level] + 1,
            };
            self.counters[level] = number;
            format!("{}.", number)
        } else {
            self.counters.truncate(level + 1);
            self.options.list_marker.to_string()
        };

        let text = self.render_inline(block.spans(), meta, index, None);
        format!("{}{} {}", indent, marker, escape_leading_marker(&text))
    }

    fn render_table(&self, blocks: &[Block], meta: &Metadata, start: usize, end: usize) -> String {
        let column_count = (start..end)
            .map(|i| {
                let cells = blocks[i].cells().len();
                meta.table(i).map_or(cells, |t| t.column_count.max(cells))
            })
            .max()
            .unwrap_or(0)
            .max(1);

        let alignments = meta
            .table(start)
            .map(|t| t.alignments.clone())
            .unwrap_or_default();

        let mut lines = Vec::with_capacity(end - start + 1);
        for index in start..end {
            let cells = blocks[index].cells();
            let mut line = String::from("|");
            for column in 0..column_count {
                let content = cells
                    .get(column)
                    .map(|cell| self.render_inline(cell.spans(), meta, index, Some(column)))
                    .unwrap_or_default();
                line.push_str(&format!(" {} |", content.trim()));
            }
            lines.push(line);

            // Separator after the first row
            if index == start {
                let mut separator = String::from("|");
                for column in 0..column_count {
                    let marker = match alignments.get(column).copied().unwrap_or_default() {
                        Alignment::Left | Alignment::Justify => " --- |",
                        Alignment::Center => " :---: |",
                        Alignment::Right => " ---: |",
                    };
                    separator.push_str(marker);
                }
                lines.push(separator);
            }
        }
        lines.join("\n")
    }

    fn render_inline(
        &self,
        spans: &[InlineSpan],
        meta: &Metadata,
        index: usize,
        cell: Option<usize>,
    ) -> String {
        let mut output = String::new();
        let mut i = 0;
        while i < spans.len() {
            match meta.link_in(index, cell, i) {
                Some(url) => {
                    let mut text = String::new();
                    while i < spans.len() && meta.link_in(index, cell, i) == Some(url) {
                        text.push_str(&self.render_span(&spans[i]));
                        i += 1;
                    }
                    output.push_str(&format!("[{}]({})", text, link_target(url)));
                }
                None => {
                    output.push_str(&self.render_span(&spans[i]));
                    i += 1;
                }
            }
        }
        output
    }

    fn render_span(&self, span: &InlineSpan) -> String {
        let text = span.text.replace('\n', " ");
        if span.emphasis.code {
            let code = render_code_span(&text);
            return apply_text_style(&code, &Emphasis { code: false, ..span.emphasis });
        }

        let text = if self.options.escape_special_chars {
            escape_markdown(&text)
        } else {
            text
        };

        // Markers hug the text; surrounding spaces stay outside.
        let trimmed = text.trim();
        if trimmed.is_empty() || span.emphasis.is_plain() {
            return text;
        }
        let start = text.len() - text.trim_start().len();
        let end = start + trimmed.len();
        format!(
            "{}{}{}",
            &text[..start],
            apply_text_style(trimmed, &span.emphasis),
            &text[end..]
        )
    }
}

fn apply_text_style(text: &str, style: &Emphasis) -> String {
    let mut result = text.to_string();

    // Apply styles (innermost first)
    if style.strikethrough {
        result = format!("~~{}~~", result);
    }
    if style.italic {
        result = format!("*{}*", result);
    }
    if style.bold {
        result = format!("**{}**", result);
    }
    if style.superscript {
        result = format!("<sup>{}</sup>", result);
    }
    if style.subscript {
        result = format!("<sub>{}</sub>", result);
    }
    if style.underline {
        result = format!("<u>{}</u>", result);
    }

    result
}

fn render_code_span(text: &str) -> String {
    if text.contains('`') {
        format!("`` {} ``", text)
    } else {
        format!("`{}`", text)
    }
}

fn render_header_box(display: &str) -> String {
    let width = display
        .lines()
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0)
        .max(MIN_BOX_WIDTH);
    let border = "=".repeat(width);
    format!("{}\n{}\n{}", border, display, border)
}

fn render_code_block(body: &str, language: Option<&str>) -> String {
    let longest_run = body
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat((longest_run + 1).max(3));
    format!("{}{}\n{}\n{}", fence, language.unwrap_or(""), body, fence)
}

/// Escape special Markdown characters.
/// Only escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            // Core formatting that must be escaped
            '\\' | '`' | '*' | '_' | '~' |
            // Brackets for links, pipe for tables
            '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            // Only when it could open a tag or comment
            '<' if chars
                .peek()
                .is_some_and(|n| n.is_ascii_alphabetic() || *n == '/' || *n == '!') =>
            {
                result.push_str("\\<");
            }
            _ => result.push(c),
        }
    }
    result
}

/// Escape a line start that would parse as a block marker.
///
/// Leading whitespace is skipped, since indented markers still open lists.
fn escape_leading_marker(line: &str) -> String {
    let rest = line.trim_start();
    let indent = &line[..line.len() - rest.len()];
    match rest.chars().next() {
        Some('#' | '>' | '-' | '+' | '=') => format!("{}\\{}", indent, rest),
        Some(c) if c.is_ascii_digit() => {
            let digits = rest.chars().take_while(char::is_ascii_digit).count();
            match rest[digits..].chars().next() {
                Some('.' | ')') => format!("{}{}\\{}", indent, &rest[..digits], &rest[digits..]),
                _ => line.to_string(),
            }
        }
        _ => line.to_string(),
    }
}

/// Link destination, wrapped in `<>` when it would end the link early.
fn link_target(url: &str) -> String {
    if url.chars().any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>')) {
        let encoded = url.replace('<', "%3C").replace('>', "%3E").replace('\n', "%0A");
        format!("<{}>", encoded)
    } else {
        url.to_string()
    }
}

/// End (exclusive) of the table starting at `start`.
fn table_end(blocks: &[Block], meta: &Metadata, start: usize) -> usize {
    let ordinal = meta.table(start).map(|t| t.table);
    let mut end = start + 1;
    while end < blocks.len()
        && blocks[end].is_table_row()
        && meta.table(end).map(|t| t.table) == ordinal
    {
        end += 1;
    }
    end
}

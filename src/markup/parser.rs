//! Line-oriented Markdown block parser.
//!
//! The parser walks the input once. Each line is classified through the
//! ordered recognizer table and the verdict is applied to a small amount of
//! open state: a fenced code block, a table, a list, and at most one pending
//! text block whose lines are still being collected. Blocks are built only
//! when their last line is known, so they are never modified after
//! construction.

use super::inline::{parse_inline, InlineText};
use super::options::ParseOptions;
use super::recognize::{
    classify, closes_fence, is_separator_cells, separator_alignment, LineWindow, Recognized,
};
use crate::error::Result;
use crate::model::{
    Alignment, Block, Document, InlineSpan, LinkMeta, ListMeta, Metadata, Properties, TableMeta,
};

/// Parser state, derived from which structures are open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// No structure open
    Default,
    /// Inside a fenced code block
    InCodeBlock,
    /// Collecting table rows
    InTable,
    /// Inside a list
    InList,
}

/// Parse Markdown body text (no front matter) into a document.
pub fn parse_blocks(body: &str, options: &ParseOptions) -> Result<Document> {
    let lines: Vec<&str> = body.lines().collect();
    let mut parser = MarkupParser::new(options);
    let mut pos = 0;

    while pos < lines.len() {
        pos += parser.feed(&lines, pos);
    }

    let (blocks, metadata) = parser.finish();
    Document::from_parts(blocks, metadata, Properties::default())
}

enum Pending {
    Paragraph(Vec<String>),
    Quote(Vec<String>),
    Item { lines: Vec<String>, meta: ListMeta },
}

struct OpenCode {
    fence: char,
    width: usize,
    indent: usize,
    info: Option<String>,
    lines: Vec<String>,
}

#[derive(Default)]
struct OpenTable {
    rows: Vec<Vec<String>>,
    has_header: bool,
    alignments: Vec<Alignment>,
}

#[derive(Default)]
struct OpenList {
    /// Indentation units of each open nesting level
    levels: Vec<usize>,
    /// Ordered-ness of the running sequence at each level
    sequences: Vec<Option<bool>>,
}

struct MarkupParser<'o> {
    options: &'o ParseOptions,
    blocks: Vec<Block>,
    metadata: Metadata,
    pending: Option<Pending>,
    code: Option<OpenCode>,
    table: Option<OpenTable>,
    list: Option<OpenList>,
    tables_emitted: usize,
}

impl<'o> MarkupParser<'o> {
    fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            blocks: Vec::new(),
            metadata: Metadata::new(),
            pending: None,
            code: None,
            table: None,
            list: None,
            tables_emitted: 0,
        }
    }

    fn state(&self) -> ParserState {
        if self.code.is_some() {
            ParserState::InCodeBlock
        } else if self.table.is_some() {
            ParserState::InTable
        } else if self.list.is_some() {
            ParserState::InList
        } else {
            ParserState::Default
        }
    }

    /// Process the line at `pos`, returning how many lines were consumed.
    fn feed(&mut self, lines: &[&str], pos: usize) -> usize {
        let line = lines[pos];

        if self.state() == ParserState::InCodeBlock {
            self.code_line(line);
            return 1;
        }

        if line.trim().is_empty() {
            self.blank_line();
            return 1;
        }

        let follows_paragraph = matches!(self.pending, Some(Pending::Paragraph(_)));
        let window = LineWindow::new(lines, pos)
            .after_paragraph(follows_paragraph)
            .inside_table(self.state() == ParserState::InTable);
        let verdict = classify(&window);
        let consumed = verdict.consumed();
        self.apply(verdict);
        consumed
    }

    fn code_line(&mut self, line: &str) {
        let Some(code) = self.code.as_mut() else {
            return;
        };
        if closes_fence(line, code.fence, code.width) {
            self.close_code();
            return;
        }
        // Strip at most the fence's own indentation.
        let strip = line
            .char_indices()
            .take(code.indent)
            .take_while(|(_, c)| *c == ' ')
            .count();
        code.lines.push(line[strip..].to_string());
    }

    fn blank_line(&mut self) {
        self.flush_pending();
        self.close_table();
    }

    fn apply(&mut self, verdict: Recognized) {
        if !matches!(verdict, Recognized::TableRow { .. }) {
            self.close_table();
        }

        match verdict {
            Recognized::CodeFence {
                fence,
                width,
                indent,
                info,
            } => {
                self.close_blocks();
                self.code = Some(OpenCode {
                    fence,
                    width,
                    indent,
                    info,
                    lines: Vec::new(),
                });
            }
            Recognized::HeaderBox { display, .. } => {
                self.close_blocks();
                self.push(Block::header_box(display));
            }
            Recognized::SetextUnderline => match self.pending.take() {
                Some(Pending::Paragraph(lines)) => {
                    self.close_list();
                    self.push_inline(&lines.join(" "), |spans, _| Block::heading(2, spans));
                }
                other => {
                    self.pending = other;
                    self.close_blocks();
                    self.push(Block::horizontal_rule());
                }
            },
            Recognized::HorizontalRule => {
                self.close_blocks();
                self.push(Block::horizontal_rule());
            }
            Recognized::Heading { level, text } => {
                self.close_blocks();
                self.push_inline(&text, |spans, _| Block::heading(level, spans));
            }
            Recognized::TableRow { cells } => self.table_row(cells),
            Recognized::Blockquote { text } => match self.pending.as_mut() {
                Some(Pending::Quote(lines)) => lines.push(text),
                _ => {
                    self.close_blocks();
                    self.pending = Some(Pending::Quote(vec![text]));
                }
            },
            Recognized::ListItem {
                spaces,
                tabs,
                ordered,
                number,
                text,
            } => {
                self.flush_pending();
                let meta = self.list_meta(spaces, tabs, ordered, number);
                self.pending = Some(Pending::Item {
                    lines: vec![text],
                    meta,
                });
            }
            Recognized::Paragraph { text } => match self.pending.as_mut() {
                Some(Pending::Paragraph(lines)) | Some(Pending::Item { lines, .. }) => {
                    lines.push(text)
                }
                _ => {
                    // A paragraph after a blank line ends the list.
                    self.close_blocks();
                    self.pending = Some(Pending::Paragraph(vec![text]));
                }
            },
        }
    }

    fn table_row(&mut self, cells: Vec<String>) {
        if let Some(table) = self.table.as_mut() {
            if table.rows.len() == 1 && !table.has_header && is_separator_cells(&cells) {
                table.has_header = true;
                table.alignments = cells.iter().map(|c| separator_alignment(c.trim())).collect();
            } else {
                table.rows.push(cells);
            }
            return;
        }

        self.close_blocks();
        self.table = Some(OpenTable {
            rows: vec![cells],
            ..Default::default()
        });
    }

    fn list_meta(
        &mut self,
        spaces: usize,
        tabs: usize,
        ordered: bool,
        number: Option<u32>,
    ) -> ListMeta {
        let unit = self.options.indent_unit();
        let units = (spaces + tabs * unit) / unit;
        let list = self.list.get_or_insert_with(OpenList::default);

        while list.levels.last().is_some_and(|&open| open > units) {
            list.levels.pop();
        }
        match list.levels.last() {
            Some(&open) if open == units => {}
            _ => list.levels.push(units),
        }
        let level = list.levels.len() - 1;

        list.sequences.truncate(level + 1);
        list.sequences.resize(level + 1, None);
        let new_sequence = list.sequences[level] != Some(ordered);
        list.sequences[level] = Some(ordered);

        let level = u8::try_from(level).unwrap_or(u8::MAX);
        if ordered {
            let start = new_sequence.then(|| number.unwrap_or(1));
            ListMeta::ordered(level, start)
        } else {
            ListMeta::bullet(level)
        }
    }

    /// Flush pending text and close any list.
    fn close_blocks(&mut self) {
        self.flush_pending();
        self.close_list();
    }

    fn close_list(&mut self) {
        self.list = None;
    }

    fn flush_pending(&mut self) {
        match self.pending.take() {
            Some(Pending::Paragraph(lines)) => {
                self.push_inline(&lines.join(" "), |spans, linked| {
                    if linked {
                        Block::hyperlink(spans)
                    } else {
                        Block::paragraph(spans)
                    }
                });
            }
            Some(Pending::Quote(lines)) => {
                self.push_inline(&lines.join(" "), |spans, _| Block::blockquote(spans));
            }
            Some(Pending::Item { lines, meta }) => {
                let index = self.push_inline(&lines.join(" "), |spans, _| Block::list_item(spans));
                self.metadata.set_list(index, meta);
            }
            None => {}
        }
    }

    fn close_code(&mut self) {
        if let Some(code) = self.code.take() {
            self.push(Block::code_block(code.info, code.lines.join("\n")));
        }
    }

    fn close_table(&mut self) {
        let Some(table) = self.table.take() else {
            return;
        };

        let ordinal = self.tables_emitted;
        self.tables_emitted += 1;

        let column_count = table.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut alignments = table.alignments;
        if table.has_header {
            alignments.resize(column_count, Alignment::Left);
        }

        for (row_index, row) in table.rows.into_iter().enumerate() {
            let mut cells = Vec::with_capacity(row.len());
            let mut links = Vec::new();
            for (cell_index, raw) in row.iter().enumerate() {
                let InlineText { spans, links: cell_links } = parse_inline(raw.trim());
                links.extend(cell_links.into_iter().map(|(span, url)| LinkMeta {
                    cell: Some(cell_index),
                    span,
                    url,
                }));
                cells.push(Block::paragraph(spans));
            }

            let index = self.push(Block::table_row(cells));
            let is_header = table.has_header && row_index == 0;
            self.metadata.set_table(
                index,
                TableMeta {
                    table: ordinal,
                    column_count,
                    is_header,
                    alignments: if is_header { alignments.clone() } else { Vec::new() },
                },
            );
            for link in links {
                self.metadata.add_link(index, link);
            }
        }
    }

    fn push(&mut self, block: Block) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    fn push_inline(
        &mut self,
        text: &str,
        build: impl FnOnce(Vec<InlineSpan>, bool) -> Block,
    ) -> usize {
        let inline = parse_inline(text);
        let linked = inline.has_links();
        let index = self.push(build(inline.spans, linked));
        for (span, url) in inline.links {
            self.metadata.add_link(
                index,
                LinkMeta {
                    cell: None,
                    span,
                    url,
                },
            );
        }
        index
    }

    fn finish(mut self) -> (Vec<Block>, Metadata) {
        if self.code.is_some() {
            log::warn!("unterminated code fence at end of input, closing it");
            self.close_code();
        }
        self.flush_pending();
        self.close_table();
        self.close_list();
        log::debug!(
            "parsed {} blocks with {} metadata entries",
            self.blocks.len(),
            self.metadata.len()
        );
        (self.blocks, self.metadata)
    }
}

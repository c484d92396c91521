//! Native document to blocks and metadata.

use super::classify::{classify_paragraph, is_monospace, run_font, Classified};
use crate::docx::{
    BodyElement, NativeDocument, NativeParagraph, NativeTable, ParagraphContent, Run, VMerge,
    VertAlign, MAX_LIST_LEVEL,
};
use crate::error::{Result, Warning};
use crate::model::{
    Alignment, Block, BlockKind, Document, Emphasis, InlineSpan, LinkMeta, ListMeta, Metadata,
    TableMeta,
};
use std::collections::HashMap;

/// Extract blocks and metadata from a native document.
///
/// Unsupported content is skipped and reported in the returned warnings.
pub fn extract(native: &NativeDocument) -> Result<(Document, Vec<Warning>)> {
    Extractor::new(native).run()
}

/// Walks the body of a native document in order.
pub struct Extractor<'a> {
    native: &'a NativeDocument,
    blocks: Vec<Block>,
    metadata: Metadata,
    warnings: Vec<Warning>,
    table_count: usize,
    list: ListTracker,
    /// Whether the previous block was a code paragraph that may be continued
    code_open: bool,
}

/// One table row before its metadata is recorded.
struct ExtractedRow {
    cells: Vec<Block>,
    links: Vec<LinkMeta>,
    alignments: Vec<Alignment>,
    is_header: bool,
}

/// Level normalization and ordered-sequence tracking for one list run.
#[derive(Default)]
struct ListTracker {
    /// Raw levels of the open nesting, outermost first
    stack: Vec<u8>,
    /// Numbering instance of the open sequence at each level
    open: [Option<u32>; MAX_LIST_LEVEL as usize + 1],
    /// Items already emitted per (numId, level) across the document
    counts: HashMap<(u32, u8), u32>,
}

impl ListTracker {
    fn end_run(&mut self) {
        self.stack.clear();
        self.open = Default::default();
    }

    /// Normalized level and start index of the next item.
    fn item(&mut self, native: &NativeDocument, raw_level: u8, ordered: bool, num_id: u32) -> ListMeta {
        let raw_level = raw_level.min(MAX_LIST_LEVEL);
        while self.stack.last().is_some_and(|top| *top > raw_level) {
            self.stack.pop();
        }
        if self.stack.last() != Some(&raw_level) {
            self.stack.push(raw_level);
        }
        let level = u8::try_from(self.stack.len() - 1).unwrap_or(MAX_LIST_LEVEL);

        let slot = usize::from(level);
        for deeper in self.open.iter_mut().skip(slot + 1) {
            *deeper = None;
        }
        // Word restarts deeper levels after a shallower item.
        self.counts
            .retain(|(num, lvl), _| !(*num == num_id && *lvl > raw_level));

        let count = self.counts.entry((num_id, raw_level)).or_insert(0);
        let position = *count;
        *count += 1;

        if !ordered {
            self.open[slot] = Some(num_id);
            return ListMeta::bullet(level);
        }

        let continues = self.open[slot] == Some(num_id);
        self.open[slot] = Some(num_id);
        if continues {
            ListMeta::ordered(level, None)
        } else {
            let first = native.numbering.start_of(num_id, raw_level).unwrap_or(1);
            ListMeta::ordered(level, Some(first + position))
        }
    }
}

impl<'a> Extractor<'a> {
    /// Create an extractor for a native document.
    pub fn new(native: &'a NativeDocument) -> Self {
        Self {
            native,
            blocks: Vec::new(),
            metadata: Metadata::new(),
            warnings: Vec::new(),
            table_count: 0,
            list: ListTracker::default(),
            code_open: false,
        }
    }

    /// Walk the body and assemble the document.
    pub fn run(mut self) -> Result<(Document, Vec<Warning>)> {
        let native = self.native;
        for element in &native.body {
            match element {
                BodyElement::Paragraph(paragraph) => self.paragraph(paragraph),
                BodyElement::Table(table) => {
                    self.list.end_run();
                    self.code_open = false;
                    self.table(table);
                }
                BodyElement::Unsupported(what) => self.unsupported(what),
            }
        }

        log::debug!(
            "extracted {} blocks with {} warnings",
            self.blocks.len(),
            self.warnings.len()
        );
        let document = Document::from_parts(self.blocks, self.metadata, native.properties.clone())?;
        Ok((document, self.warnings))
    }

    fn unsupported(&mut self, what: &str) {
        log::warn!("skipping unsupported element: {}", what);
        self.warnings.push(Warning::UnsupportedElement(what.to_string()));
    }

    fn paragraph(&mut self, paragraph: &NativeParagraph) {
        for content in &paragraph.content {
            if let ParagraphContent::Unsupported(what) = content {
                self.unsupported(what);
            }
        }

        let classified = classify_paragraph(paragraph, self.native);
        let text = paragraph.text();
        if text.trim().is_empty() && classified != Classified::HorizontalRule {
            // Blank paragraphs separate code paragraphs but not list items.
            self.code_open = false;
            return;
        }

        if !matches!(classified, Classified::ListItem { .. }) {
            self.list.end_run();
        }
        if classified != Classified::CodeBlock {
            self.code_open = false;
        }

        let index = self.blocks.len();
        let block = match classified {
            Classified::HeaderBox => Block::header_box(text.trim()),
            Classified::HorizontalRule => Block::horizontal_rule(),
            Classified::Heading(level) => {
                let (spans, links) = self.spans(paragraph);
                self.record_links(index, links);
                Block::heading(level, without_bold(spans))
            }
            Classified::ListItem {
                level,
                ordered,
                numbering,
            } => {
                let num_id = numbering.map(|n| n.num_id).unwrap_or(0);
                let meta = self.list.item(self.native, level, ordered, num_id);
                self.metadata.set_list(index, meta);
                let (spans, links) = self.spans(paragraph);
                self.record_links(index, links);
                Block::list_item(spans)
            }
            Classified::CodeBlock => {
                if self.code_open {
                    self.extend_code(&text);
                    return;
                }
                self.code_open = true;
                Block::code_block(None, text)
            }
            Classified::Blockquote => {
                let (spans, links) = self.spans(paragraph);
                self.record_links(index, links);
                Block::blockquote(spans)
            }
            Classified::Paragraph => {
                let (spans, links) = self.spans(paragraph);
                let has_links = !links.is_empty();
                self.record_links(index, links);
                if has_links {
                    Block::hyperlink(spans)
                } else {
                    Block::paragraph(spans)
                }
            }
        };

        if !matches!(
            classified,
            Classified::HeaderBox | Classified::HorizontalRule | Classified::CodeBlock
        ) {
            if let Some(alignment) = paragraph_alignment(paragraph, self.native) {
                self.metadata.set_alignment(index, alignment);
            }
        }
        self.blocks.push(block);
    }

    /// Join a code paragraph onto the previous code block.
    fn extend_code(&mut self, text: &str) {
        let Some(previous) = self.blocks.pop() else {
            return;
        };
        let language = match previous.kind() {
            BlockKind::CodeBlock { language } => language.clone(),
            _ => None,
        };
        self.blocks.push(Block::code_block(
            language,
            format!("{}\n{}", previous.text(), text),
        ));
    }

    fn table(&mut self, table: &NativeTable) {
        if table.rows.is_empty() {
            return;
        }
        let ordinal = self.table_count;
        self.table_count += 1;

        let mut rows = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut cells = Vec::new();
            let mut links = Vec::new();
            let mut alignments = Vec::new();
            for cell in &row.cells {
                let column = cells.len();
                if cell.v_merge == Some(VMerge::Continue) {
                    cells.push(Block::plain(""));
                    alignments.push(Alignment::Left);
                } else {
                    let mut spans = Vec::new();
                    for (i, paragraph) in cell.paragraphs.iter().enumerate() {
                        if i > 0 && !spans.is_empty() {
                            spans.push(InlineSpan::plain(" "));
                        }
                        let (mut more, more_links) = self.spans(paragraph);
                        let offset = spans.len();
                        links.extend(
                            more_links
                                .into_iter()
                                .map(|(span, url)| LinkMeta {
                                    cell: Some(column),
                                    span: span + offset,
                                    url,
                                }),
                        );
                        spans.append(&mut more);
                    }
                    if row.is_header {
                        spans = without_bold(spans);
                    }
                    cells.push(Block::paragraph(spans));
                    alignments.push(
                        cell.paragraphs
                            .first()
                            .and_then(|p| paragraph_alignment(p, self.native))
                            .unwrap_or_default(),
                    );
                }
                for _ in 1..cell.grid_span {
                    cells.push(Block::plain(""));
                    alignments.push(Alignment::Left);
                }
            }
            rows.push(ExtractedRow {
                cells,
                links,
                alignments,
                is_header: row.is_header,
            });
        }

        let column_count = rows
            .iter()
            .map(|row| row.cells.len())
            .chain(std::iter::once(table.column_count))
            .max()
            .unwrap_or(0);

        for row in rows {
            let ExtractedRow {
                cells,
                links,
                mut alignments,
                is_header,
            } = row;
            let index = self.blocks.len();
            for link in links {
                self.metadata.add_link(index, link);
            }
            if is_header {
                alignments.resize(column_count, Alignment::Left);
            }
            let has_alignment = alignments.iter().any(|a| *a != Alignment::Left);
            self.metadata.set_table(
                index,
                TableMeta {
                    table: ordinal,
                    column_count,
                    is_header,
                    alignments: if is_header && has_alignment {
                        alignments
                    } else {
                        Vec::new()
                    },
                },
            );
            self.blocks.push(Block::table_row(cells));
        }
    }

    fn record_links(&mut self, index: usize, links: Vec<(usize, String)>) {
        for (span, url) in links {
            self.metadata.add_link(index, LinkMeta { cell: None, span, url });
        }
    }

    /// Inline spans of a paragraph plus `(span index, url)` link targets.
    ///
    /// Adjacent runs with the same emphasis and link are merged.
    fn spans(&self, paragraph: &NativeParagraph) -> (Vec<InlineSpan>, Vec<(usize, String)>) {
        let runs = paragraph.content.iter().flat_map(|content| match content {
            ParagraphContent::Run(run) => vec![(run, None)],
            ParagraphContent::Hyperlink { target, runs } => {
                runs.iter().map(|run| (run, Some(target.as_str()))).collect()
            }
            ParagraphContent::Unsupported(_) => Vec::new(),
        });

        let mut spans: Vec<InlineSpan> = Vec::new();
        let mut targets: Vec<Option<&str>> = Vec::new();
        for (run, target) in runs {
            if run.text.is_empty() {
                continue;
            }
            // Line breaks only survive in header boxes and code.
            let text = run.text.replace('\n', " ");
            let emphasis = self.emphasis(run, paragraph);
            if let (Some(last), Some(last_target)) = (spans.last_mut(), targets.last()) {
                if last.emphasis == emphasis && *last_target == target {
                    last.text.push_str(&text);
                    continue;
                }
            }
            spans.push(InlineSpan::new(text, emphasis));
            targets.push(target);
        }

        let links = targets
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.map(|url| (i, url.to_string())))
            .collect();
        (spans, links)
    }

    fn emphasis(&self, run: &Run, paragraph: &NativeParagraph) -> Emphasis {
        let props = &run.props;
        Emphasis {
            bold: props.bold,
            italic: props.italic,
            code: is_monospace(run_font(run, paragraph, self.native)),
            strikethrough: props.strike,
            underline: props.underline && props.style_id.as_deref() != Some("Hyperlink"),
            superscript: props.vert_align == VertAlign::Superscript,
            subscript: props.vert_align == VertAlign::Subscript,
        }
    }
}

fn without_bold(spans: Vec<InlineSpan>) -> Vec<InlineSpan> {
    spans
        .into_iter()
        .map(|mut span| {
            span.emphasis.bold = false;
            span
        })
        .collect()
}

/// Non-left alignment of a paragraph, direct or from its style.
fn paragraph_alignment(paragraph: &NativeParagraph, native: &NativeDocument) -> Option<Alignment> {
    paragraph
        .props
        .alignment
        .or_else(|| {
            paragraph
                .props
                .style_id
                .as_deref()
                .and_then(|id| native.styles.get(id))
                .and_then(|s| s.paragraph.alignment)
        })
        .filter(|a| *a != Alignment::Left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{
        AbstractNum, Border, NativeCell, NativeRow, NumFormat, NumLevel, NumberingRef, RunProps,
    };

    fn text_paragraph(text: &str) -> NativeParagraph {
        let mut p = NativeParagraph::default();
        p.push_run(Run::plain(text));
        p
    }

    fn styled(style: &str, text: &str) -> NativeParagraph {
        let mut p = NativeParagraph::styled(style);
        p.push_run(Run::plain(text));
        p
    }

    #[test]
    fn test_blank_paragraphs_skipped() {
        let mut native = NativeDocument::new();
        native.push_paragraph(text_paragraph("one"));
        native.push_paragraph(NativeParagraph::default());
        native.push_paragraph(text_paragraph("   "));
        native.push_paragraph(text_paragraph("two"));

        let (doc, warnings) = extract(&native).unwrap();
        assert_eq!(doc.len(), 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_unsupported_recorded() {
        let mut native = NativeDocument::new();
        let mut p = text_paragraph("caption");
        p.content.push(ParagraphContent::Unsupported("drawing".into()));
        native.push_paragraph(p);
        native
            .body
            .push(BodyElement::Unsupported("header reference".into()));

        let (doc, warnings) = extract(&native).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(
            warnings,
            vec![
                Warning::UnsupportedElement("drawing".into()),
                Warning::UnsupportedElement("header reference".into()),
            ]
        );
    }

    #[test]
    fn test_rule_and_box() {
        let mut native = NativeDocument::new();
        let mut rule = NativeParagraph::default();
        rule.props.border_bottom = Some(Border::single(6));
        native.push_paragraph(rule);

        let mut header = NativeParagraph::default();
        header.props.alignment = Some(Alignment::Center);
        header.props.border_top = Some(Border::single(16));
        header.props.border_bottom = Some(Border::single(16));
        header.push_run(Run::new(
            "🔍 REPORT\nQ3",
            RunProps {
                bold: true,
                ..Default::default()
            },
        ));
        native.push_paragraph(header);

        let (doc, _) = extract(&native).unwrap();
        assert_eq!(*doc.blocks()[0].kind(), BlockKind::HorizontalRule);
        assert_eq!(*doc.blocks()[1].kind(), BlockKind::HeaderBox);
        assert_eq!(doc.blocks()[1].text(), "🔍 REPORT\nQ3");
        assert_eq!(doc.metadata().alignment(1), Alignment::Left);
    }

    fn numbered_document() -> (NativeDocument, u32) {
        let mut native = NativeDocument::new();
        native.numbering.abstracts.push(AbstractNum {
            id: 1,
            levels: (0..3)
                .map(|level| NumLevel {
                    level,
                    format: NumFormat::Decimal,
                    text: format!("%{}.", level + 1),
                    start: 1,
                    indent: 360,
                })
                .collect(),
        });
        let num_id = native.numbering.add_instance(1, None);
        (native, num_id)
    }

    fn item(num_id: u32, level: u8, text: &str) -> NativeParagraph {
        let mut p = styled("ListNumber", text);
        p.props.numbering = Some(NumberingRef { num_id, level });
        p
    }

    #[test]
    fn test_list_levels_normalized() {
        let (mut native, num_id) = numbered_document();
        native.push_paragraph(item(num_id, 2, "deep first"));
        native.push_paragraph(item(num_id, 2, "still deep"));
        native.push_paragraph(item(num_id, 0, "top"));
        native.push_paragraph(item(num_id, 2, "jump"));

        let (doc, _) = extract(&native).unwrap();
        let levels: Vec<u8> = (0..4).map(|i| doc.metadata().list(i).unwrap().level).collect();
        assert_eq!(levels, vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_word_continued_numbering() {
        let (mut native, num_id) = numbered_document();
        native.push_paragraph(item(num_id, 0, "one"));
        native.push_paragraph(item(num_id, 0, "two"));
        native.push_paragraph(text_paragraph("interruption"));
        native.push_paragraph(item(num_id, 0, "three"));

        let (doc, _) = extract(&native).unwrap();
        let meta = doc.metadata();
        assert_eq!(meta.list(0), Some(&ListMeta::ordered(0, Some(1))));
        assert_eq!(meta.list(1), Some(&ListMeta::ordered(0, None)));
        assert_eq!(meta.list(3), Some(&ListMeta::ordered(0, Some(3))));
    }

    #[test]
    fn test_merged_cells() {
        let mut native = NativeDocument::new();
        let cell = |text: &str| NativeCell::with_paragraph(text_paragraph(text));
        let mut wide = cell("wide");
        wide.grid_span = 2;
        let mut continued = NativeCell::default();
        continued.v_merge = Some(VMerge::Continue);

        native.push_table(NativeTable {
            style_id: None,
            autofit: true,
            column_count: 3,
            rows: vec![
                NativeRow {
                    is_header: true,
                    cells: vec![wide, cell("c")],
                },
                NativeRow {
                    is_header: false,
                    cells: vec![cell("a"), continued, cell("z")],
                },
            ],
        });

        let (doc, _) = extract(&native).unwrap();
        let header: Vec<&str> = doc.blocks()[0].cells().iter().map(Block::text).collect();
        assert_eq!(header, vec!["wide", "", "c"]);
        let body: Vec<&str> = doc.blocks()[1].cells().iter().map(Block::text).collect();
        assert_eq!(body, vec!["a", "", "z"]);

        let meta = doc.metadata().table(0).unwrap();
        assert_eq!(meta.column_count, 3);
        assert!(meta.is_header);
    }

    #[test]
    fn test_links_and_code_merge() {
        let mut native = NativeDocument::new();
        let mut p = text_paragraph("read ");
        p.content.push(ParagraphContent::Hyperlink {
            target: "https://example.com".into(),
            runs: vec![Run::plain("the "), Run::plain("docs")],
        });
        native.push_paragraph(p);
        native.push_paragraph(styled("Code", "line one"));
        native.push_paragraph(styled("Code", "line two"));

        let (doc, _) = extract(&native).unwrap();
        assert_eq!(doc.len(), 2);
        assert_eq!(*doc.blocks()[0].kind(), BlockKind::Hyperlink);
        assert_eq!(doc.blocks()[0].spans().len(), 2);
        assert_eq!(
            doc.metadata().link_for_span(0, 1),
            Some("https://example.com")
        );
        assert_eq!(doc.blocks()[1].text(), "line one\nline two");
    }

    #[test]
    fn test_heading_drops_bold() {
        let mut native = NativeDocument::new();
        let mut p = NativeParagraph::default();
        p.push_run(Run::new(
            "Summary",
            RunProps {
                bold: true,
                size: Some(32),
                ..Default::default()
            },
        ));
        native.push_paragraph(p);

        let (doc, _) = extract(&native).unwrap();
        assert_eq!(doc.blocks()[0].heading_level(), Some(1));
        assert!(doc.blocks()[0].spans()[0].emphasis.is_plain());
    }
}

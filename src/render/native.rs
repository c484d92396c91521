//! Blocks and metadata to a [`NativeDocument`].
//!
//! Rendering is deterministic: the same document and style configuration
//! always produce the same native document.

use crate::docx::{
    inches_to_twips, points_to_half_points, points_to_twips, AbstractNum, BodyElement, Border,
    Indent, NativeCell, NativeDocument, NativeParagraph, NativeRow, NativeTable, NumFormat,
    NumLevel, Numbering, NumberingRef, ParagraphContent, ParagraphProps, Run, RunProps, Spacing,
    StyleDef, StyleKind, StyleSheet, VertAlign, MAX_LIST_LEVEL,
};
use crate::error::Result;
use crate::model::{Alignment, Block, BlockKind, Document, Emphasis, InlineSpan, Metadata};
use crate::style::{RgbColor, StyleConfig};

/// Style id of the character style applied to link text.
pub const HYPERLINK_STYLE: &str = "Hyperlink";

const BULLET_ABSTRACT: u32 = 0;
const NUMBER_ABSTRACT: u32 = 1;
const BULLET_GLYPHS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];

/// Horizontal rule: bottom border, 3pt above and below.
const RULE_SPACING_PT: f64 = 3.0;
const RULE_BORDER: u32 = 6;

/// Header box: 2pt borders, 4pt spacing, 14pt bold text.
const BOX_BORDER: u32 = 16;
const BOX_SPACING_PT: f64 = 4.0;
const BOX_TEXT_PT: f64 = 14.0;

/// Code blocks: 0.25in side indents, 6pt spacing.
const CODE_INDENT_IN: f64 = 0.25;
const CODE_SPACING_PT: f64 = 6.0;

const QUOTE_INDENT_IN: f64 = 0.5;
const LINK_COLOR: RgbColor = RgbColor(0x05, 0x63, 0xC1);

/// Render a document into a native document.
pub fn render_native(doc: &Document, style: &StyleConfig) -> Result<NativeDocument> {
    NativeRenderer::new(style).render(doc)
}

/// Native document renderer.
pub struct NativeRenderer<'a> {
    style: &'a StyleConfig,
    out: NativeDocument,
    bullet_num: Option<u32>,
    ordered_nums: [Option<u32>; MAX_LIST_LEVEL as usize + 1],
}

impl<'a> NativeRenderer<'a> {
    /// Create a renderer for the given style configuration.
    pub fn new(style: &'a StyleConfig) -> Self {
        Self {
            style,
            out: NativeDocument::new(),
            bullet_num: None,
            ordered_nums: Default::default(),
        }
    }

    /// Render a document.
    pub fn render(mut self, doc: &Document) -> Result<NativeDocument> {
        doc.metadata().validate(doc.blocks())?;

        self.out.styles = self.stylesheet();
        self.out.properties = doc.properties.clone();

        let blocks = doc.blocks();
        let meta = doc.metadata();
        let mut index = 0;
        while index < blocks.len() {
            let block = &blocks[index];
            if *block.kind() != BlockKind::ListItem {
                self.end_lists();
            }
            if block.is_table_row() {
                let end = table_end(blocks, meta, index);
                self.render_table(blocks, meta, index, end);
                index = end;
                continue;
            }
            let paragraph = self.render_block(block, meta, index);
            self.out.push_paragraph(paragraph);
            index += 1;
        }

        log::debug!(
            "rendered {} blocks into {} body elements",
            blocks.len(),
            self.out.body.len()
        );
        Ok(self.out)
    }

    fn builtin(&self) -> bool {
        self.style.use_builtin_styles
    }

    fn render_block(&mut self, block: &Block, meta: &Metadata, index: usize) -> NativeParagraph {
        let mut paragraph = match block.kind() {
            BlockKind::Heading { level } => self.heading(block, meta, index, *level),
            BlockKind::HorizontalRule => self.rule(),
            BlockKind::HeaderBox => self.header_box(block),
            BlockKind::CodeBlock { .. } => self.code(block),
            BlockKind::ListItem => self.list_item(block, meta, index),
            BlockKind::Blockquote => {
                let mut paragraph = self.styled("quote", "Quote");
                let base = RunProps {
                    italic: !self.builtin(),
                    ..Default::default()
                };
                if !self.builtin() {
                    paragraph.props.indent.left = Some(inches_to_twips(QUOTE_INDENT_IN));
                }
                paragraph.content = self.span_content(block.spans(), meta, index, None, &base);
                paragraph
            }
            BlockKind::Paragraph | BlockKind::Hyperlink | BlockKind::TableRow => {
                let mut paragraph = if self.style.style_override("paragraph").is_some() {
                    self.styled("paragraph", "Normal")
                } else {
                    NativeParagraph::default()
                };
                paragraph.content =
                    self.span_content(block.spans(), meta, index, None, &RunProps::default());
                paragraph
            }
        };

        match meta.alignment(index) {
            Alignment::Left => {}
            alignment => paragraph.props.alignment = Some(alignment),
        }
        paragraph
    }

    fn heading(&mut self, block: &Block, meta: &Metadata, index: usize, level: u8) -> NativeParagraph {
        let key = format!("heading{}", level);
        let mut paragraph = self.styled(&key, &format!("Heading{}", level));
        let mut base = RunProps::default();
        if !self.builtin() {
            let style_id = paragraph.props.style_id.take();
            paragraph.props = ParagraphProps {
                style_id,
                ..self.heading_paragraph_props(level)
            };
            base = self.heading_run_props(level);
        }
        paragraph.content = self.span_content(block.spans(), meta, index, None, &base);
        paragraph
    }

    fn heading_paragraph_props(&self, level: u8) -> ParagraphProps {
        ParagraphProps {
            keep_next: true,
            spacing: Spacing {
                before: Some(points_to_twips(self.style.heading_before(level))),
                after: Some(points_to_twips(self.style.heading_after(level))),
                line: None,
            },
            ..Default::default()
        }
    }

    fn heading_run_props(&self, level: u8) -> RunProps {
        RunProps {
            bold: true,
            font: Some(self.style.heading_font_name().to_string()),
            size: Some(points_to_half_points(self.style.heading_size(level))),
            color: Some(self.style.heading_color(level)),
            ..Default::default()
        }
    }

    fn rule(&self) -> NativeParagraph {
        let mut paragraph = NativeParagraph::default();
        paragraph.props.border_bottom = Some(Border::single(RULE_BORDER));
        paragraph.props.spacing = Spacing::around(points_to_twips(RULE_SPACING_PT));
        paragraph
    }

    fn header_box(&self, block: &Block) -> NativeParagraph {
        let mut paragraph = NativeParagraph::default();
        paragraph.props.alignment = Some(Alignment::Center);
        paragraph.props.border_top = Some(Border::single(BOX_BORDER));
        paragraph.props.border_bottom = Some(Border::single(BOX_BORDER));
        paragraph.props.spacing = Spacing::around(points_to_twips(BOX_SPACING_PT));
        paragraph.push_run(Run::new(
            block.text(),
            RunProps {
                bold: true,
                size: Some(points_to_half_points(BOX_TEXT_PT)),
                ..Default::default()
            },
        ));
        paragraph
    }

    fn code(&mut self, block: &Block) -> NativeParagraph {
        let mut paragraph = self.styled("code", "Code");
        if !self.builtin() {
            let style_id = paragraph.props.style_id.take();
            paragraph.props = ParagraphProps {
                style_id,
                ..self.code_paragraph_props()
            };
        }
        let mut props = self.code_run_props();
        // Keep the shading on the paragraph only.
        props.shading = None;
        paragraph.push_run(Run::new(block.text(), props));
        paragraph
    }

    fn code_paragraph_props(&self) -> ParagraphProps {
        let indent = inches_to_twips(CODE_INDENT_IN);
        ParagraphProps {
            spacing: Spacing {
                line: Some(240),
                ..Spacing::around(points_to_twips(CODE_SPACING_PT))
            },
            indent: Indent {
                left: Some(indent),
                right: Some(indent),
                ..Default::default()
            },
            shading: Some(self.style.code_shading()),
            ..Default::default()
        }
    }

    fn code_run_props(&self) -> RunProps {
        RunProps {
            font: Some(self.style.code_font_name().to_string()),
            size: Some(points_to_half_points(self.style.code_font_size())),
            ..Default::default()
        }
    }

    fn list_item(&mut self, block: &Block, meta: &Metadata, index: usize) -> NativeParagraph {
        let list = meta.list(index).copied().unwrap_or_else(|| {
            log::warn!("list item {} has no list metadata, rendering as a bullet", index);
            crate::model::ListMeta::bullet(0)
        });
        let level = list.level.min(MAX_LIST_LEVEL);

        let num_id = if list.ordered {
            self.ordered_instance(level, list.start_index)
        } else {
            self.bullet_instance()
        };

        let mut paragraph = if list.ordered {
            self.styled("list_number", "ListNumber")
        } else {
            self.styled("list_bullet", "ListBullet")
        };
        if !self.builtin() {
            paragraph.props.spacing.after = Some(points_to_twips(self.style.list_after()));
        }
        paragraph.props.numbering = Some(NumberingRef { num_id, level });
        paragraph.content = self.span_content(block.spans(), meta, index, None, &RunProps::default());
        paragraph
    }

    fn bullet_instance(&mut self) -> u32 {
        if let Some(id) = self.bullet_num {
            return id;
        }
        self.ensure_numbering();
        let id = self.out.numbering.add_instance(BULLET_ABSTRACT, None);
        self.bullet_num = Some(id);
        id
    }

    fn ordered_instance(&mut self, level: u8, start: Option<u32>) -> u32 {
        let slot = usize::from(level);
        if start.is_none() {
            if let Some(id) = self.ordered_nums[slot] {
                return id;
            }
        }
        self.ensure_numbering();
        let id = self
            .out
            .numbering
            .add_instance(NUMBER_ABSTRACT, Some((level, start.unwrap_or(1))));
        self.ordered_nums[slot] = Some(id);
        // Deeper sequences restart under a new parent item.
        for deeper in self.ordered_nums.iter_mut().skip(slot + 1) {
            *deeper = None;
        }
        id
    }

    fn end_lists(&mut self) {
        self.ordered_nums = Default::default();
    }

    fn ensure_numbering(&mut self) {
        if self.out.numbering.abstracts.is_empty() {
            self.out.numbering = self.numbering();
        }
    }

    fn numbering(&self) -> Numbering {
        let indent = |level: u8| inches_to_twips(self.style.list_level_indent() * f64::from(level + 1));
        let levels = |format: NumFormat| -> Vec<NumLevel> {
            (0..=MAX_LIST_LEVEL)
                .map(|level| NumLevel {
                    level,
                    text: match format {
                        NumFormat::Bullet => BULLET_GLYPHS[usize::from(level) % 3].to_string(),
                        _ => format!("%{}.", level + 1),
                    },
                    format: format.clone(),
                    start: 1,
                    indent: indent(level),
                })
                .collect()
        };

        Numbering {
            abstracts: vec![
                AbstractNum {
                    id: BULLET_ABSTRACT,
                    levels: levels(NumFormat::Bullet),
                },
                AbstractNum {
                    id: NUMBER_ABSTRACT,
                    levels: levels(NumFormat::Decimal),
                },
            ],
            instances: Vec::new(),
        }
    }

    fn render_table(&mut self, blocks: &[Block], meta: &Metadata, start: usize, end: usize) {
        let rows = &blocks[start..end];
        let column_count = rows
            .iter()
            .map(|r| r.cells().len())
            .chain(meta.table(start).map(|t| t.column_count))
            .max()
            .unwrap_or(0)
            .max(1);

        let alignments = (start..end)
            .filter_map(|i| meta.table(i))
            .find(|t| t.is_header)
            .map(|t| t.alignments.clone())
            .unwrap_or_default();

        let mut table = NativeTable {
            style_id: Some(self.table_style_id()),
            autofit: self.style.table_autofit,
            column_count,
            rows: Vec::with_capacity(rows.len()),
        };

        for (offset, row) in rows.iter().enumerate() {
            let index = start + offset;
            let is_header = meta.table(index).map(|t| t.is_header).unwrap_or(false);
            let base = RunProps {
                bold: is_header,
                ..Default::default()
            };

            let mut native_row = NativeRow {
                is_header,
                cells: Vec::with_capacity(column_count),
            };
            for column in 0..column_count {
                let mut paragraph = NativeParagraph::default();
                paragraph.props.spacing.after = Some(0);
                if let Some(cell) = row.cells().get(column) {
                    paragraph.content =
                        self.span_content(cell.spans(), meta, index, Some(column), &base);
                }
                match alignments.get(column) {
                    Some(Alignment::Left) | None => {}
                    Some(alignment) => paragraph.props.alignment = Some(*alignment),
                }
                native_row.cells.push(NativeCell::with_paragraph(paragraph));
            }
            table.rows.push(native_row);
        }

        // Adjacent tables would merge into one.
        if matches!(self.out.body.last(), Some(BodyElement::Table(_))) {
            self.out.push_paragraph(NativeParagraph::default());
        }
        self.out.push_table(table);
    }

    fn span_content(
        &self,
        spans: &[InlineSpan],
        meta: &Metadata,
        index: usize,
        cell: Option<usize>,
        base: &RunProps,
    ) -> Vec<ParagraphContent> {
        let mut content: Vec<ParagraphContent> = Vec::with_capacity(spans.len());
        for (i, span) in spans.iter().enumerate() {
            let mut props = self.span_props(&span.emphasis, base);
            let run_text = span.text.clone();
            match meta.link_in(index, cell, i) {
                Some(url) => {
                    props.style_id = Some(HYPERLINK_STYLE.to_string());
                    let run = Run::new(run_text, props);
                    // Consecutive spans of one link stay in one element.
                    if let Some(ParagraphContent::Hyperlink { target, runs }) = content.last_mut() {
                        if target == url {
                            runs.push(run);
                            continue;
                        }
                    }
                    content.push(ParagraphContent::Hyperlink {
                        target: url.to_string(),
                        runs: vec![run],
                    });
                }
                None => content.push(ParagraphContent::Run(Run::new(run_text, props))),
            }
        }
        content
    }

    fn span_props(&self, emphasis: &Emphasis, base: &RunProps) -> RunProps {
        let mut props = base.clone();
        props.bold |= emphasis.bold;
        props.italic |= emphasis.italic;
        props.underline |= emphasis.underline;
        props.strike |= emphasis.strikethrough;
        if emphasis.superscript {
            props.vert_align = VertAlign::Superscript;
        } else if emphasis.subscript {
            props.vert_align = VertAlign::Subscript;
        }
        if emphasis.code {
            let code = self.code_run_props();
            props.font = code.font;
            props.size = code.size;
        }
        props
    }

    /// Paragraph for an element category, honouring `custom_style_map`.
    fn styled(&mut self, element: &str, default_id: &str) -> NativeParagraph {
        if let Some(name) = self.style.style_override(element) {
            let id = style_id_for(name);
            if self.out.styles.get(&id).is_none() {
                let mut custom = StyleDef::new(id.clone(), name, StyleKind::Paragraph);
                custom.based_on = Some(default_id.to_string());
                self.out.styles.insert(custom);
            }
            return NativeParagraph::styled(id);
        }
        if self.builtin() {
            NativeParagraph::styled(default_id)
        } else {
            NativeParagraph::default()
        }
    }

    fn table_style_id(&mut self) -> String {
        let name = self
            .style
            .style_override("table")
            .unwrap_or_else(|| self.style.table_style_name())
            .to_string();
        let id = style_id_for(&name);
        if self.out.styles.get(&id).is_none() {
            self.out
                .styles
                .insert(StyleDef::new(id.clone(), name, StyleKind::Table));
        }
        id
    }

    fn stylesheet(&self) -> StyleSheet {
        let style = self.style;
        let mut sheet = StyleSheet {
            default_run: RunProps {
                font: Some(style.body_font().to_string()),
                size: Some(points_to_half_points(style.body_size())),
                ..Default::default()
            },
            default_paragraph: Default::default(),
            styles: Vec::new(),
        };

        let mut normal = StyleDef::new("Normal", "Normal", StyleKind::Paragraph);
        normal.paragraph.spacing = Spacing {
            before: None,
            after: Some(points_to_twips(style.paragraph_after())),
            line: Some((style.line_spacing() * 240.0).round() as u32),
        };
        let first_line = inches_to_twips(style.first_line_indent());
        if first_line > 0 {
            normal.paragraph.indent.first_line = Some(first_line);
        }
        normal.run = sheet.default_run.clone();
        sheet.insert(normal);

        for level in 1..=6u8 {
            let mut heading = StyleDef::new(
                format!("Heading{}", level),
                format!("heading {}", level),
                StyleKind::Paragraph,
            );
            heading.based_on = Some("Normal".into());
            heading.next = Some("Normal".into());
            heading.paragraph = self.heading_paragraph_props(level);
            heading.run = self.heading_run_props(level);
            sheet.insert(heading);
        }

        for (id, name) in [("ListBullet", "List Bullet"), ("ListNumber", "List Number")] {
            let mut list = StyleDef::new(id, name, StyleKind::Paragraph);
            list.based_on = Some("Normal".into());
            list.paragraph.spacing.after = Some(points_to_twips(style.list_after()));
            sheet.insert(list);
        }

        let mut quote = StyleDef::new("Quote", "Quote", StyleKind::Paragraph);
        quote.based_on = Some("Normal".into());
        quote.paragraph.indent.left = Some(inches_to_twips(QUOTE_INDENT_IN));
        quote.run.italic = true;
        sheet.insert(quote);

        let mut code = StyleDef::new("Code", "Code", StyleKind::Paragraph);
        code.based_on = Some("Normal".into());
        code.paragraph = self.code_paragraph_props();
        code.run = self.code_run_props();
        sheet.insert(code);

        let mut link = StyleDef::new(HYPERLINK_STYLE, "Hyperlink", StyleKind::Character);
        link.run.color = Some(LINK_COLOR);
        link.run.underline = true;
        sheet.insert(link);

        sheet
    }
}

/// Style ids are style names without whitespace.
fn style_id_for(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
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

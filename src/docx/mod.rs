//! Native document model and DOCX package I/O.
//!
//! [`NativeDocument`] is a typed subset of WordprocessingML: paragraphs with
//! runs and hyperlinks, tables, borders, numbering and a style sheet. It is
//! built by the native renderer and read by the extractor. [`writer`] turns
//! it into a package, [`reader`] parses one back.
//!
//! Units follow OOXML: spacing and indents in twips (1/20 pt), font sizes in
//! half-points, border widths in eighths of a point.

pub mod reader;
pub mod writer;

pub use reader::read_package;
pub use writer::{is_xml_char, write_package};

use crate::error::Result;
use crate::model::{Alignment, Properties};
use crate::style::RgbColor;

/// Twips per point.
pub const TWIPS_PER_POINT: u32 = 20;

/// Twips per inch.
pub const TWIPS_PER_INCH: u32 = 1440;

/// Deepest list level OOXML supports (levels 0..=8).
pub const MAX_LIST_LEVEL: u8 = 8;

/// Convert points to twips.
pub fn points_to_twips(points: f64) -> u32 {
    (points * f64::from(TWIPS_PER_POINT)).round().max(0.0) as u32
}

/// Convert inches to twips.
pub fn inches_to_twips(inches: f64) -> u32 {
    (inches * f64::from(TWIPS_PER_INCH)).round().max(0.0) as u32
}

/// Convert points to half-points.
pub fn points_to_half_points(points: f64) -> u32 {
    (points * 2.0).round().max(0.0) as u32
}

/// An in-memory DOCX document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeDocument {
    /// Body content in order
    pub body: Vec<BodyElement>,

    /// Paragraph, character and table styles
    pub styles: StyleSheet,

    /// List numbering definitions
    pub numbering: Numbering,

    /// Core document properties
    pub properties: Properties,
}

impl NativeDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a DOCX package.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        read_package(data)
    }

    /// Serialize as a DOCX package.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        write_package(self)
    }

    /// Append a paragraph.
    pub fn push_paragraph(&mut self, paragraph: NativeParagraph) {
        self.body.push(BodyElement::Paragraph(paragraph));
    }

    /// Append a table.
    pub fn push_table(&mut self, table: NativeTable) {
        self.body.push(BodyElement::Table(table));
    }

    /// Iterate over top-level paragraphs.
    pub fn paragraphs(&self) -> impl Iterator<Item = &NativeParagraph> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Iterate over tables.
    pub fn tables(&self) -> impl Iterator<Item = &NativeTable> {
        self.body.iter().filter_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            _ => None,
        })
    }
}

/// One element of the document body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyElement {
    /// `w:p`
    Paragraph(NativeParagraph),
    /// `w:tbl`
    Table(NativeTable),
    /// Anything else, named by its element or a short description
    Unsupported(String),
}

/// A paragraph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeParagraph {
    /// Paragraph properties
    pub props: ParagraphProps,
    /// Runs and hyperlinks
    pub content: Vec<ParagraphContent>,
}

impl NativeParagraph {
    /// Create an empty paragraph with the given style.
    pub fn styled(style_id: impl Into<String>) -> Self {
        Self {
            props: ParagraphProps {
                style_id: Some(style_id.into()),
                ..Default::default()
            },
            content: Vec::new(),
        }
    }

    /// Append a run.
    pub fn push_run(&mut self, run: Run) {
        self.content.push(ParagraphContent::Run(run));
    }

    /// All runs, including those inside hyperlinks.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().flat_map(|c| match c {
            ParagraphContent::Run(run) => std::slice::from_ref(run),
            ParagraphContent::Hyperlink { runs, .. } => runs.as_slice(),
            ParagraphContent::Unsupported(_) => &[][..],
        })
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph carries at least one hyperlink.
    pub fn has_hyperlinks(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, ParagraphContent::Hyperlink { .. }))
    }
}

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub enum ParagraphContent {
    /// `w:r`
    Run(Run),
    /// `w:hyperlink` with an external target
    Hyperlink {
        /// Resolved target URL
        target: String,
        /// Runs of the link text
        runs: Vec<Run>,
    },
    /// Drawings, objects and other inline content that is not text
    Unsupported(String),
}

/// Paragraph properties (`w:pPr`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphProps {
    /// Paragraph style id
    pub style_id: Option<String>,
    /// Justification
    pub alignment: Option<Alignment>,
    /// Top border
    pub border_top: Option<Border>,
    /// Bottom border
    pub border_bottom: Option<Border>,
    /// Spacing
    pub spacing: Spacing,
    /// Indentation
    pub indent: Indent,
    /// List numbering reference
    pub numbering: Option<NumberingRef>,
    /// Background shading
    pub shading: Option<RgbColor>,
    /// Keep with next paragraph
    pub keep_next: bool,
}

impl ParagraphProps {
    /// Check if any border is set.
    pub fn has_border(&self) -> bool {
        self.border_top.is_some() || self.border_bottom.is_some()
    }
}

/// A paragraph border line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Border {
    /// Line style, e.g. `single`
    pub style: String,
    /// Width in eighths of a point
    pub size: u32,
    /// Line colour; `None` means automatic
    pub color: Option<RgbColor>,
    /// Distance from text in points
    pub space: u32,
}

impl Border {
    /// A single black line of the given width in eighths of a point.
    pub fn single(size: u32) -> Self {
        Self {
            style: "single".into(),
            size,
            color: Some(RgbColor(0, 0, 0)),
            space: 1,
        }
    }
}

/// Paragraph spacing in twips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacing {
    /// Space before
    pub before: Option<u32>,
    /// Space after
    pub after: Option<u32>,
    /// Line spacing in 240ths of a line
    pub line: Option<u32>,
}

impl Spacing {
    /// Equal space before and after.
    pub fn around(twips: u32) -> Self {
        Self {
            before: Some(twips),
            after: Some(twips),
            line: None,
        }
    }
}

/// Paragraph indentation in twips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Indent {
    /// Left indent
    pub left: Option<u32>,
    /// Right indent
    pub right: Option<u32>,
    /// First-line indent
    pub first_line: Option<u32>,
    /// Hanging indent
    pub hanging: Option<u32>,
}

/// Reference from a paragraph to a numbering instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberingRef {
    /// `w:numId`
    pub num_id: u32,
    /// `w:ilvl`
    pub level: u8,
}

/// A run of text with one set of properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Run {
    /// Run properties
    pub props: RunProps,
    /// Text; `\n` is a line break and `\t` a tab
    pub text: String,
}

impl Run {
    /// Create a run.
    pub fn new(text: impl Into<String>, props: RunProps) -> Self {
        Self {
            props,
            text: text.into(),
        }
    }

    /// Create an unformatted run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunProps::default())
    }
}

/// Run properties (`w:rPr`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunProps {
    /// Character style id
    pub style_id: Option<String>,
    /// Bold
    pub bold: bool,
    /// Italic
    pub italic: bool,
    /// Single underline
    pub underline: bool,
    /// Strikethrough
    pub strike: bool,
    /// Superscript or subscript
    pub vert_align: VertAlign,
    /// Font family (ASCII and high-ANSI slots)
    pub font: Option<String>,
    /// Size in half-points
    pub size: Option<u32>,
    /// Text colour
    pub color: Option<RgbColor>,
    /// Background shading
    pub shading: Option<RgbColor>,
}

/// Vertical alignment of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VertAlign {
    /// Normal
    #[default]
    Baseline,
    /// Raised
    Superscript,
    /// Lowered
    Subscript,
}

/// A table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeTable {
    /// Table style id
    pub style_id: Option<String>,
    /// Autofit layout
    pub autofit: bool,
    /// Number of grid columns
    pub column_count: usize,
    /// Rows in order
    pub rows: Vec<NativeRow>,
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeRow {
    /// Repeated as a header row on each page
    pub is_header: bool,
    /// Cells in order
    pub cells: Vec<NativeCell>,
}

/// A table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeCell {
    /// Cell paragraphs; OOXML requires at least one
    pub paragraphs: Vec<NativeParagraph>,
    /// Number of grid columns spanned
    pub grid_span: u32,
    /// Vertical merge state
    pub v_merge: Option<VMerge>,
}

impl Default for NativeCell {
    fn default() -> Self {
        Self {
            paragraphs: Vec::new(),
            grid_span: 1,
            v_merge: None,
        }
    }
}

impl NativeCell {
    /// A cell holding one paragraph.
    pub fn with_paragraph(paragraph: NativeParagraph) -> Self {
        Self {
            paragraphs: vec![paragraph],
            ..Default::default()
        }
    }

    /// Cell text, paragraphs joined by spaces.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(NativeParagraph::text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Vertical merge state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMerge {
    /// First cell of a vertical merge
    Restart,
    /// Cell covered by the merge above
    Continue,
}

/// Kind of a style definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    /// Paragraph style
    Paragraph,
    /// Character style
    Character,
    /// Table style
    Table,
}

impl StyleKind {
    /// Value of the `w:type` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            StyleKind::Paragraph => "paragraph",
            StyleKind::Character => "character",
            StyleKind::Table => "table",
        }
    }
}

/// One style definition.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDef {
    /// Style id referenced by paragraphs and runs
    pub id: String,
    /// Display name
    pub name: String,
    /// Style kind
    pub kind: StyleKind,
    /// Parent style id
    pub based_on: Option<String>,
    /// Style applied to the following paragraph
    pub next: Option<String>,
    /// Paragraph properties
    pub paragraph: ParagraphProps,
    /// Run properties
    pub run: RunProps,
}

impl StyleDef {
    /// A style with no properties.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: StyleKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            based_on: None,
            next: None,
            paragraph: ParagraphProps::default(),
            run: RunProps::default(),
        }
    }
}

/// The style part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSheet {
    /// Document default run properties
    pub default_run: RunProps,
    /// Document default paragraph properties
    pub default_paragraph: ParagraphProps,
    /// Style definitions
    pub styles: Vec<StyleDef>,
}

impl StyleSheet {
    /// Look up a style by id.
    pub fn get(&self, id: &str) -> Option<&StyleDef> {
        self.styles.iter().find(|s| s.id == id)
    }

    /// Display name of a style, falling back to the id.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|s| s.name.as_str()).unwrap_or(id)
    }

    /// Add or replace a style.
    pub fn insert(&mut self, style: StyleDef) {
        match self.styles.iter_mut().find(|s| s.id == style.id) {
            Some(existing) => *existing = style,
            None => self.styles.push(style),
        }
    }

    /// Font of a style, following `basedOn` links.
    pub fn style_font(&self, id: &str) -> Option<&str> {
        self.resolve(id, |s| s.run.font.as_deref())
    }

    /// Size of a style in half-points, following `basedOn` links.
    pub fn style_size(&self, id: &str) -> Option<u32> {
        self.resolve(id, |s| s.run.size)
    }

    fn resolve<'a, T>(&'a self, id: &str, get: impl Fn(&'a StyleDef) -> Option<T>) -> Option<T> {
        let mut current = self.get(id);
        // Style chains are short; the bound guards against cycles.
        for _ in 0..16 {
            let style = current?;
            if let Some(value) = get(style) {
                return Some(value);
            }
            current = style.based_on.as_deref().and_then(|b| self.get(b));
        }
        None
    }
}

/// Number format of a list level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumFormat {
    /// Bullet glyph
    Bullet,
    /// 1, 2, 3
    Decimal,
    /// Any other format, by its OOXML name
    Other(String),
}

impl NumFormat {
    /// Parse a `w:numFmt` value.
    pub fn parse(value: &str) -> Self {
        match value {
            "bullet" => NumFormat::Bullet,
            "decimal" => NumFormat::Decimal,
            other => NumFormat::Other(other.to_string()),
        }
    }

    /// The `w:numFmt` value.
    pub fn as_str(&self) -> &str {
        match self {
            NumFormat::Bullet => "bullet",
            NumFormat::Decimal => "decimal",
            NumFormat::Other(s) => s,
        }
    }

    /// Whether items are numbered rather than bulleted.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, NumFormat::Bullet)
    }
}

/// One level of an abstract numbering definition.
#[derive(Debug, Clone, PartialEq)]
pub struct NumLevel {
    /// Level (0-8)
    pub level: u8,
    /// Number format
    pub format: NumFormat,
    /// Level text, e.g. `%1.` or a bullet glyph
    pub text: String,
    /// First number
    pub start: u32,
    /// Left indent in twips
    pub indent: u32,
}

/// An abstract numbering definition.
#[derive(Debug, Clone, PartialEq)]
pub struct AbstractNum {
    /// `w:abstractNumId`
    pub id: u32,
    /// Levels
    pub levels: Vec<NumLevel>,
}

/// A numbering instance referenced by paragraphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumInstance {
    /// `w:numId`
    pub id: u32,
    /// Abstract definition
    pub abstract_id: u32,
    /// Level start overrides as `(level, start)`
    pub start_overrides: Vec<(u8, u32)>,
}

/// The numbering part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Numbering {
    /// Abstract definitions
    pub abstracts: Vec<AbstractNum>,
    /// Instances
    pub instances: Vec<NumInstance>,
}

impl Numbering {
    /// Check if there are no definitions.
    pub fn is_empty(&self) -> bool {
        self.abstracts.is_empty() && self.instances.is_empty()
    }

    /// Add an instance of an abstract definition, returning its `numId`.
    pub fn add_instance(&mut self, abstract_id: u32, start_override: Option<(u8, u32)>) -> u32 {
        let id = self.instances.iter().map(|i| i.id).max().unwrap_or(0) + 1;
        self.instances.push(NumInstance {
            id,
            abstract_id,
            start_overrides: start_override.into_iter().collect(),
        });
        id
    }

    /// Level definition used by a paragraph's numbering reference.
    pub fn level(&self, num_id: u32, level: u8) -> Option<&NumLevel> {
        let instance = self.instances.iter().find(|i| i.id == num_id)?;
        self.abstracts
            .iter()
            .find(|a| a.id == instance.abstract_id)?
            .levels
            .iter()
            .find(|l| l.level == level)
    }

    /// First number of a level, honouring start overrides.
    pub fn start_of(&self, num_id: u32, level: u8) -> Option<u32> {
        let instance = self.instances.iter().find(|i| i.id == num_id)?;
        instance
            .start_overrides
            .iter()
            .find(|(l, _)| *l == level)
            .map(|(_, start)| *start)
            .or_else(|| self.level(num_id, level).map(|l| l.start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(points_to_twips(3.0), 60);
        assert_eq!(inches_to_twips(0.25), 360);
        assert_eq!(points_to_half_points(10.5), 21);
        assert_eq!(points_to_twips(-1.0), 0);
    }

    #[test]
    fn test_paragraph_text_includes_links() {
        let mut p = NativeParagraph::default();
        p.push_run(Run::plain("see "));
        p.content.push(ParagraphContent::Hyperlink {
            target: "https://example.com".into(),
            runs: vec![Run::plain("here")],
        });
        assert_eq!(p.text(), "see here");
        assert!(p.has_hyperlinks());
    }

    #[test]
    fn test_style_resolution() {
        let mut sheet = StyleSheet::default();
        let mut base = StyleDef::new("Code", "Code", StyleKind::Paragraph);
        base.run.font = Some("Consolas".into());
        let mut child = StyleDef::new("CodeSmall", "Code Small", StyleKind::Paragraph);
        child.based_on = Some("Code".into());
        child.run.size = Some(16);
        sheet.insert(base);
        sheet.insert(child);

        assert_eq!(sheet.style_font("CodeSmall"), Some("Consolas"));
        assert_eq!(sheet.style_size("CodeSmall"), Some(16));
        assert_eq!(sheet.name_of("CodeSmall"), "Code Small");
        assert_eq!(sheet.name_of("Missing"), "Missing");
    }

    #[test]
    fn test_style_cycle_terminates() {
        let mut sheet = StyleSheet::default();
        let mut a = StyleDef::new("A", "A", StyleKind::Paragraph);
        a.based_on = Some("B".into());
        let mut b = StyleDef::new("B", "B", StyleKind::Paragraph);
        b.based_on = Some("A".into());
        sheet.insert(a);
        sheet.insert(b);
        assert_eq!(sheet.style_font("A"), None);
    }

    #[test]
    fn test_numbering_start_override() {
        let mut numbering = Numbering::default();
        numbering.abstracts.push(AbstractNum {
            id: 1,
            levels: vec![NumLevel {
                level: 0,
                format: NumFormat::Decimal,
                text: "%1.".into(),
                start: 1,
                indent: 720,
            }],
        });
        let plain = numbering.add_instance(1, None);
        let restarted = numbering.add_instance(1, Some((0, 5)));

        assert_ne!(plain, restarted);
        assert_eq!(numbering.start_of(plain, 0), Some(1));
        assert_eq!(numbering.start_of(restarted, 0), Some(5));
        assert!(numbering.level(restarted, 0).unwrap().format.is_ordered());
    }
}

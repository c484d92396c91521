//! Paragraph classification for the extractor.
//!
//! A paragraph's style is first mapped onto the closed [`StyleCategory`]
//! set. Normal and unrecognized styles fall back to inspecting direct
//! properties with a fixed rule order.

use crate::docx::{NativeDocument, NativeParagraph, NumberingRef, ParagraphProps, Run};
use crate::model::Alignment;

/// Characters a typed-out rule line may consist of.
const RULE_CHARS: &[char] = &['-', '=', '_', '*', '─', '━', '═'];

/// Minimum length of a typed-out rule line.
const RULE_MIN_LEN: usize = 10;

/// Size in half-points from which an all-bold paragraph is a heading.
const HEADING_MIN_SIZE: u32 = 28;

/// Size in half-points from which a size-detected heading is level 1.
const HEADING_L1_SIZE: u32 = 32;

/// Longest text a size-detected heading may have.
const HEADING_MAX_CHARS: usize = 120;

/// Style categories the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleCategory {
    /// Document title
    Title,
    /// `Heading N`
    Heading(u8),
    /// `List Bullet`, `List Bullet N` (level is zero-based)
    ListBullet(u8),
    /// `List Number`, `List Number N` (level is zero-based)
    ListNumber(u8),
    /// `List Paragraph`; the numbering reference decides
    ListParagraph,
    /// Quotations
    Quote,
    /// Preformatted code
    Code,
    /// Body text
    Normal,
    /// Anything else
    Unrecognized,
}

impl StyleCategory {
    /// Map a style name or id onto a category.
    ///
    /// Case and whitespace are ignored, so both `heading 1` and
    /// `Heading1` are headings.
    pub fn from_style_name(name: &str) -> Self {
        let compact: String = name
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        if let Some(n) = compact.strip_prefix("heading") {
            if let Ok(level) = n.parse::<u8>() {
                if level >= 1 {
                    return StyleCategory::Heading(level.min(6));
                }
            }
            return StyleCategory::Unrecognized;
        }
        if let Some(n) = compact.strip_prefix("listbullet") {
            return list_level(n).map_or(StyleCategory::Unrecognized, StyleCategory::ListBullet);
        }
        if let Some(n) = compact.strip_prefix("listnumber") {
            return list_level(n).map_or(StyleCategory::Unrecognized, StyleCategory::ListNumber);
        }

        match compact.as_str() {
            "title" => StyleCategory::Title,
            "listparagraph" => StyleCategory::ListParagraph,
            "quote" | "intensequote" | "blocktext" => StyleCategory::Quote,
            "code" | "htmlpreformatted" | "sourcecode" | "macrotext" => StyleCategory::Code,
            "normal" | "bodytext" | "nospacing" | "" => StyleCategory::Normal,
            _ => StyleCategory::Unrecognized,
        }
    }

    /// Whether direct properties decide the block kind.
    pub fn needs_inspection(self) -> bool {
        matches!(
            self,
            StyleCategory::Normal | StyleCategory::Unrecognized | StyleCategory::ListParagraph
        )
    }
}

/// `""` is level 0, `"2"` is level 1.
fn list_level(suffix: &str) -> Option<u8> {
    if suffix.is_empty() {
        return Some(0);
    }
    suffix
        .parse::<u8>()
        .ok()
        .filter(|n| *n >= 1)
        .map(|n| n - 1)
}

/// Category of a paragraph style, following `basedOn` links until a known
/// category is found.
pub fn style_category(native: &NativeDocument, style_id: Option<&str>) -> StyleCategory {
    let Some(mut id) = style_id else {
        return StyleCategory::Normal;
    };
    for _ in 0..16 {
        let Some(style) = native.styles.get(id) else {
            return StyleCategory::from_style_name(id);
        };
        let category = match StyleCategory::from_style_name(&style.name) {
            StyleCategory::Unrecognized => StyleCategory::from_style_name(&style.id),
            known => known,
        };
        if category != StyleCategory::Unrecognized {
            return category;
        }
        match style.based_on.as_deref() {
            Some(parent) => id = parent,
            None => break,
        }
    }
    StyleCategory::Unrecognized
}

/// Block kind decided for one paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// Centered bordered title box
    HeaderBox,
    /// Rule line
    HorizontalRule,
    /// Heading of the given level
    Heading(u8),
    /// List item
    ListItem {
        /// Raw level before normalization
        level: u8,
        /// Numbered rather than bulleted
        ordered: bool,
        /// Numbering reference, when the paragraph has one
        numbering: Option<NumberingRef>,
    },
    /// Preformatted code
    CodeBlock,
    /// Quotation
    Blockquote,
    /// Body text (or a link-bearing paragraph)
    Paragraph,
}

/// Classify a paragraph.
pub fn classify_paragraph(paragraph: &NativeParagraph, native: &NativeDocument) -> Classified {
    let category = style_category(native, paragraph.props.style_id.as_deref());
    let numbering = effective_numbering(paragraph, native);

    let classified = match category {
        StyleCategory::Title => Classified::Heading(1),
        StyleCategory::Heading(level) => Classified::Heading(level),
        StyleCategory::Quote => Classified::Blockquote,
        StyleCategory::Code => Classified::CodeBlock,
        StyleCategory::ListBullet(level) | StyleCategory::ListNumber(level) => {
            let default_ordered = matches!(category, StyleCategory::ListNumber(_));
            list_item(native, numbering, level, default_ordered)
        }
        StyleCategory::ListParagraph | StyleCategory::Normal | StyleCategory::Unrecognized => {
            inspect(paragraph, native, numbering)
        }
    };
    log::debug!(
        "paragraph style {:?} ({:?}) classified as {:?}",
        paragraph.props.style_id,
        category,
        classified
    );
    classified
}

/// Numbering reference, ignoring `numId` 0 which means "no numbering".
fn effective_numbering(paragraph: &NativeParagraph, native: &NativeDocument) -> Option<NumberingRef> {
    let direct = paragraph.props.numbering;
    let inherited = || {
        paragraph
            .props
            .style_id
            .as_deref()
            .and_then(|id| native.styles.get(id))
            .and_then(|s| s.paragraph.numbering)
    };
    direct.or_else(inherited).filter(|n| n.num_id != 0)
}

fn list_item(
    native: &NativeDocument,
    numbering: Option<NumberingRef>,
    style_level: u8,
    default_ordered: bool,
) -> Classified {
    let ordered = numbering
        .and_then(|n| native.numbering.level(n.num_id, n.level))
        .map(|l| l.format.is_ordered())
        .unwrap_or(default_ordered);
    Classified::ListItem {
        level: numbering.map(|n| n.level).unwrap_or(style_level),
        ordered,
        numbering,
    }
}

/// Direct-property rules, in order.
fn inspect(
    paragraph: &NativeParagraph,
    native: &NativeDocument,
    numbering: Option<NumberingRef>,
) -> Classified {
    let text = paragraph.text();
    let trimmed = text.trim();
    let props = &paragraph.props;
    let runs: Vec<&Run> = paragraph.runs().filter(|r| !r.text.trim().is_empty()).collect();

    if props.has_border()
        && props.alignment == Some(Alignment::Center)
        && !trimmed.is_empty()
        && runs.iter().all(|r| r.props.bold)
    {
        return Classified::HeaderBox;
    }
    if props.has_border() && trimmed.is_empty() {
        return Classified::HorizontalRule;
    }
    if is_rule_line(trimmed) {
        return Classified::HorizontalRule;
    }
    if numbering.is_some() {
        return list_item(native, numbering, 0, false);
    }
    if !runs.is_empty()
        && has_code_layout(paragraph, native)
        && runs.iter().all(|r| is_monospace(run_font(r, paragraph, native)))
    {
        return Classified::CodeBlock;
    }
    if let Some(level) = heading_by_size(paragraph, native, &runs, trimmed) {
        return Classified::Heading(level);
    }
    Classified::Paragraph
}

/// Shading or indents on both sides, set directly or through the paragraph
/// style.
///
/// Monospace runs without either are inline code in a body paragraph.
fn has_code_layout(paragraph: &NativeParagraph, native: &NativeDocument) -> bool {
    let laid_out = |props: &ParagraphProps| {
        let indented = |side: Option<u32>| side.is_some_and(|twips| twips > 0);
        props.shading.is_some() || (indented(props.indent.left) && indented(props.indent.right))
    };
    laid_out(&paragraph.props)
        || paragraph
            .props
            .style_id
            .as_deref()
            .and_then(|id| native.styles.get(id))
            .is_some_and(|style| laid_out(&style.paragraph))
}

/// A line of one repeated rule character, at least ten long.
pub fn is_rule_line(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    RULE_CHARS.contains(&first) && text.chars().count() >= RULE_MIN_LEN && chars.all(|c| c == first)
}

fn heading_by_size(
    paragraph: &NativeParagraph,
    native: &NativeDocument,
    runs: &[&Run],
    text: &str,
) -> Option<u8> {
    if runs.is_empty()
        || text.contains('\n')
        || text.chars().count() > HEADING_MAX_CHARS
        || !runs.iter().all(|r| r.props.bold)
    {
        return None;
    }
    let size = runs
        .iter()
        .map(|r| run_size(r, paragraph, native))
        .min()
        .flatten()?;
    match size {
        s if s >= HEADING_L1_SIZE => Some(1),
        s if s >= HEADING_MIN_SIZE => Some(2),
        _ => None,
    }
}

/// Effective font of a run: direct, character style, paragraph style, default.
pub fn run_font<'a>(run: &'a Run, paragraph: &'a NativeParagraph, native: &'a NativeDocument) -> Option<&'a str> {
    run.props
        .font
        .as_deref()
        .or_else(|| run.props.style_id.as_deref().and_then(|id| native.styles.style_font(id)))
        .or_else(|| {
            paragraph
                .props
                .style_id
                .as_deref()
                .and_then(|id| native.styles.style_font(id))
        })
        .or(native.styles.default_run.font.as_deref())
}

/// Effective size of a run in half-points.
fn run_size(run: &Run, paragraph: &NativeParagraph, native: &NativeDocument) -> Option<u32> {
    run.props
        .size
        .or_else(|| {
            paragraph
                .props
                .style_id
                .as_deref()
                .and_then(|id| native.styles.style_size(id))
        })
        .or(native.styles.default_run.size)
}

/// Whether a font family is monospaced.
pub fn is_monospace(font: Option<&str>) -> bool {
    let Some(font) = font else {
        return false;
    };
    let font = font.to_lowercase();
    ["mono", "courier", "consolas", "menlo", "monaco", "lucida console", "code"]
        .iter()
        .any(|needle| font.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{
        AbstractNum, Border, NumFormat, NumLevel, RunProps, StyleDef, StyleKind,
    };
    use crate::style::RgbColor;

    #[test]
    fn test_style_names() {
        assert_eq!(StyleCategory::from_style_name("heading 2"), StyleCategory::Heading(2));
        assert_eq!(StyleCategory::from_style_name("Heading9"), StyleCategory::Heading(6));
        assert_eq!(StyleCategory::from_style_name("List Bullet"), StyleCategory::ListBullet(0));
        assert_eq!(StyleCategory::from_style_name("List Number 3"), StyleCategory::ListNumber(2));
        assert_eq!(StyleCategory::from_style_name("Title"), StyleCategory::Title);
        assert_eq!(StyleCategory::from_style_name("Intense Quote"), StyleCategory::Quote);
        assert_eq!(StyleCategory::from_style_name("HTML Preformatted"), StyleCategory::Code);
        assert_eq!(StyleCategory::from_style_name("Normal"), StyleCategory::Normal);
        assert_eq!(StyleCategory::from_style_name("Caption"), StyleCategory::Unrecognized);
        assert_eq!(StyleCategory::from_style_name("Headingless"), StyleCategory::Unrecognized);
    }

    #[test]
    fn test_based_on_chain() {
        let mut native = NativeDocument::new();
        let mut custom = StyleDef::new("Chapter", "Chapter", StyleKind::Paragraph);
        custom.based_on = Some("Heading1".into());
        native.styles.insert(custom);
        native
            .styles
            .insert(StyleDef::new("Heading1", "heading 1", StyleKind::Paragraph));

        assert_eq!(style_category(&native, Some("Chapter")), StyleCategory::Heading(1));
        assert_eq!(style_category(&native, Some("Missing")), StyleCategory::Unrecognized);
        assert_eq!(style_category(&native, None), StyleCategory::Normal);
    }

    fn run(text: &str, props: RunProps) -> NativeParagraph {
        let mut p = NativeParagraph::default();
        p.push_run(Run::new(text, props));
        p
    }

    #[test]
    fn test_border_rules() {
        let native = NativeDocument::new();
        let bold = RunProps {
            bold: true,
            ..Default::default()
        };

        let mut header = run("REPORT", bold.clone());
        header.props.alignment = Some(Alignment::Center);
        header.props.border_top = Some(Border::single(16));
        assert_eq!(classify_paragraph(&header, &native), Classified::HeaderBox);

        let mut rule = NativeParagraph::default();
        rule.props.border_bottom = Some(Border::single(6));
        assert_eq!(classify_paragraph(&rule, &native), Classified::HorizontalRule);

        let typed = run("__________", RunProps::default());
        assert_eq!(classify_paragraph(&typed, &native), Classified::HorizontalRule);
        let short = run("_________", RunProps::default());
        assert_eq!(classify_paragraph(&short, &native), Classified::Paragraph);
    }

    #[test]
    fn test_numbering_decides_order() {
        let mut native = NativeDocument::new();
        native.numbering.abstracts.push(AbstractNum {
            id: 3,
            levels: vec![NumLevel {
                level: 1,
                format: NumFormat::Decimal,
                text: "%2.".into(),
                start: 1,
                indent: 720,
            }],
        });
        let num_id = native.numbering.add_instance(3, None);

        let mut p = run("item", RunProps::default());
        p.props.numbering = Some(NumberingRef { num_id, level: 1 });
        match classify_paragraph(&p, &native) {
            Classified::ListItem { level, ordered, .. } => {
                assert_eq!(level, 1);
                assert!(ordered);
            }
            other => panic!("expected list item, got {:?}", other),
        }

        p.props.numbering = Some(NumberingRef { num_id: 0, level: 0 });
        assert_eq!(classify_paragraph(&p, &native), Classified::Paragraph);
    }

    #[test]
    fn test_monospace_and_size() {
        let native = NativeDocument::new();
        let code = run(
            "let x = 1;",
            RunProps {
                font: Some("Courier New".into()),
                ..Default::default()
            },
        );
        // Monospace alone is inline code.
        assert_eq!(classify_paragraph(&code, &native), Classified::Paragraph);

        let mut shaded = code.clone();
        shaded.props.shading = Some(RgbColor(0xF5, 0xF5, 0xF5));
        assert_eq!(classify_paragraph(&shaded, &native), Classified::CodeBlock);

        let mut indented = code.clone();
        indented.props.indent.left = Some(360);
        assert_eq!(classify_paragraph(&indented, &native), Classified::Paragraph);
        indented.props.indent.right = Some(360);
        assert_eq!(classify_paragraph(&indented, &native), Classified::CodeBlock);

        let big = run(
            "Overview",
            RunProps {
                bold: true,
                size: Some(32),
                ..Default::default()
            },
        );
        assert_eq!(classify_paragraph(&big, &native), Classified::Heading(1));

        let medium = run(
            "Details",
            RunProps {
                bold: true,
                size: Some(28),
                ..Default::default()
            },
        );
        assert_eq!(classify_paragraph(&medium, &native), Classified::Heading(2));

        let body_bold = run(
            "Important",
            RunProps {
                bold: true,
                size: Some(22),
                ..Default::default()
            },
        );
        assert_eq!(classify_paragraph(&body_bold, &native), Classified::Paragraph);
    }
}

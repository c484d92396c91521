//! Round trips between Markdown, native documents and DOCX packages.

use docmark::docx::{read_package, write_package, BodyElement, NativeDocument, NativeParagraph, Run};
use docmark::extract::extract;
use docmark::markup::{parse_markup, ParseOptions};
use docmark::model::{Alignment, BlockKind, Document};
use docmark::render::{render_native, to_markdown, RenderOptions};
use docmark::{docx_to_markdown, markdown_to_docx, native_to_markup, StyleConfig};

fn parse(text: &str) -> Document {
    parse_markup(text, &StyleConfig::default(), &ParseOptions::default())
        .unwrap()
        .document
}

fn kinds(doc: &Document) -> Vec<BlockKind> {
    doc.blocks().iter().map(|b| b.kind().clone()).collect()
}

/// Markdown → DOCX bytes → Markdown.
fn through_docx(text: &str) -> String {
    let docx = markdown_to_docx(text, &StyleConfig::default()).unwrap();
    docx_to_markdown(&docx).unwrap()
}

#[test]
fn test_rule_survives_round_trip() {
    let source = "Intro\n\n----------\n\nOutro\n";
    let before = parse(source);
    assert_eq!(
        kinds(&before),
        vec![BlockKind::Paragraph, BlockKind::HorizontalRule, BlockKind::Paragraph]
    );

    let after = parse(&through_docx(source));
    assert_eq!(kinds(&after), kinds(&before));
}

#[test]
fn test_report_example() {
    let source = "==========\n🔍 REPORT\n==========\n- item one\n- item two\n";
    let doc = parse(source);

    assert_eq!(
        kinds(&doc),
        vec![BlockKind::HeaderBox, BlockKind::ListItem, BlockKind::ListItem]
    );
    assert_eq!(doc.blocks()[0].text(), "🔍 REPORT");
    assert_eq!(doc.blocks()[1].text(), "item one");
    assert_eq!(doc.metadata().list(1).map(|l| l.level), Some(0));
    assert_eq!(doc.metadata().list(2).map(|l| l.level), Some(0));

    let markdown = to_markdown(&doc, &RenderOptions::default()).unwrap();
    assert_eq!(
        markdown,
        "==========\n🔍 REPORT\n==========\n\n- item one\n- item two\n"
    );

    let back = through_docx(source);
    assert!(back.starts_with("==========\n🔍 REPORT\n==========\n"));
    assert_eq!(kinds(&parse(&back)), kinds(&doc));
}

#[test]
fn test_header_box_wins_over_rules() {
    let doc = parse("====\nTITLE\n====\n");
    assert_eq!(kinds(&doc), vec![BlockKind::HeaderBox]);
    assert_eq!(doc.blocks()[0].text(), "TITLE");
}

#[test]
fn test_rule_threshold() {
    let nine = parse(&"-".repeat(9));
    assert_eq!(kinds(&nine), vec![BlockKind::Paragraph]);

    let ten = parse(&"-".repeat(10));
    assert_eq!(kinds(&ten), vec![BlockKind::HorizontalRule]);
}

#[test]
fn test_table_padding() {
    let source = "| a | b | c |\n|---|---|---|\n| 1 |\n| w | x | y | z |\n";
    let doc = parse(source);
    let native = render_native(&doc, &StyleConfig::default()).unwrap();

    let table = native
        .body
        .iter()
        .find_map(|e| match e {
            BodyElement::Table(t) => Some(t),
            _ => None,
        })
        .unwrap();
    assert_eq!(table.column_count, 4);
    assert!(table.rows.iter().all(|r| r.cells.len() == 4));

    let texts: Vec<String> = table
        .rows
        .iter()
        .flat_map(|r| r.cells.iter().map(|c| c.text()))
        .filter(|t| !t.is_empty())
        .collect();
    assert_eq!(texts, vec!["a", "b", "c", "1", "w", "x", "y", "z"]);
}

#[test]
fn test_list_levels_never_jump() {
    let doc = parse("- a\n        - b\n            - c\n- d\n");
    let levels: Vec<u8> = (0..doc.len())
        .filter_map(|i| doc.metadata().list(i).map(|l| l.level))
        .collect();
    assert_eq!(levels, vec![0, 1, 2, 0]);
    for pair in levels.windows(2) {
        assert!(pair[1] <= pair[0] + 1);
    }
}

#[test]
fn test_metadata_does_not_repeat_text() {
    let doc = parse("- item one\n- item two\n");
    let json = serde_json::to_string(doc.metadata()).unwrap();
    assert!(!json.contains("item one"));
    assert!(!json.contains("item two"));
}

#[test]
fn test_alignment_restored_from_trailer() {
    let mut doc = parse("# Title\n\ncentered text\n");
    let (blocks, mut metadata, properties) = doc.into_parts();
    metadata.set_alignment(1, Alignment::Center);
    doc = Document::from_parts(blocks, metadata, properties).unwrap();

    // Native → package → native → Markdown keeps the alignment in the trailer.
    let native = render_native(&doc, &StyleConfig::default()).unwrap();
    let package = write_package(&native).unwrap();
    let (extracted, warnings) = extract(&read_package(&package).unwrap()).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(extracted.metadata().alignment(1), Alignment::Center);

    let markdown = to_markdown(&extracted, &RenderOptions::default()).unwrap();
    assert!(markdown.contains("DOCMARK_METADATA"));

    let reparsed = parse(&markdown);
    assert_eq!(reparsed.len(), 2);
    assert_eq!(reparsed.metadata().alignment(1), Alignment::Center);
}

#[test]
fn test_markdown_is_stable_after_one_pass() {
    let source = "\
# Quarterly Report

Revenue grew **twelve percent** and *margins* held.

## Details

- first point
  - nested point
- second point

1. one
2. two

| Region | Sales |
| --- | ---: |
| North | 10 |
| South | 12 |

> Numbers are preliminary.

See [the dashboard](https://example.com/dash) for more.
";
    let first = through_docx(source);
    let second = through_docx(&first);
    assert_eq!(first, second);
    assert!(first.starts_with("# Quarterly Report\n\n"));
    assert!(first.contains("**twelve percent**"));
    assert!(first.contains("  - nested point"));
    assert!(first.contains("| --- | ---: |"));
    assert!(first.contains("[the dashboard](https://example.com/dash)"));
}

#[test]
fn test_rules_around_text_keep_their_content() {
    let doc = parse("---\n# Title\n---\nBody\n");
    assert_eq!(
        kinds(&doc),
        vec![
            BlockKind::HorizontalRule,
            BlockKind::Heading { level: 1 },
            BlockKind::HorizontalRule,
            BlockKind::Paragraph,
        ]
    );
}

#[test]
fn test_leading_rule_survives_round_trip() {
    let source = "***\n\nNote: read this\n\n---\n\nbody\n";
    let expected = vec![
        BlockKind::HorizontalRule,
        BlockKind::Paragraph,
        BlockKind::HorizontalRule,
        BlockKind::Paragraph,
    ];
    assert_eq!(kinds(&parse(source)), expected);

    let markdown = through_docx(source);
    assert_eq!(markdown, source);
    assert_eq!(kinds(&parse(&markdown)), expected);
}

#[test]
fn test_inline_code_paragraph_stays_inline() {
    let source = "Run `cargo build` now.\n\n`cargo build`\n";
    assert_eq!(through_docx(source), source);

    let fenced = "```\ncargo build\n```\n";
    assert_eq!(through_docx(fenced), fenced);
}

#[test]
fn test_link_with_parentheses_round_trip() {
    let url = "https://en.wikipedia.org/wiki/Rust_(lang)";
    let markdown = through_docx(&format!("See [Rust]({}) docs.\n", url));
    assert_eq!(markdown, format!("See [Rust](<{}>) docs.\n", url));

    let doc = parse(&markdown);
    assert_eq!(doc.blocks()[0].text(), "See Rust docs.");
    assert_eq!(doc.metadata().link_for_span(0, 1), Some(url));
}

#[test]
fn test_indented_marker_text_stays_paragraph() {
    for text in ["  - note", "   1. x"] {
        let mut native = NativeDocument::new();
        let mut paragraph = NativeParagraph::default();
        paragraph.push_run(Run::plain(text));
        native.push_paragraph(paragraph);

        let markdown = native_to_markup(&native).unwrap();
        let doc = parse(&markdown);
        assert_eq!(kinds(&doc), vec![BlockKind::Paragraph], "{:?}", markdown);
        assert_eq!(doc.blocks()[0].text().trim(), text.trim());
    }
}

//! Benchmarks for docmark conversion performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic Markdown with a mix of block kinds.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use docmark::markup::{parse_markup, ParseOptions};
use docmark::render::{render_native, to_markdown, RenderOptions};
use docmark::StyleConfig;

/// Creates synthetic Markdown with the given number of sections.
fn create_test_markdown(sections: usize) -> String {
    let mut content = String::new();
    for i in 0..sections {
        content.push_str(&format!("## Section {}\n\n", i + 1));
        content.push_str("Body text with **bold**, *italic* and `code` spans.\n\n");
        content.push_str("- first item\n  - nested item\n- second item\n\n");
        content.push_str("| Name | Value |\n| --- | ---: |\n| alpha | 1 |\n| beta | 2 |\n\n");
        content.push_str("```rust\nfn main() {}\n```\n\n");
        content.push_str("----------\n\n");
    }
    content
}

/// Benchmark format detection.
fn bench_format_detection(c: &mut Criterion) {
    let markdown = create_test_markdown(1);
    let docx = docmark::markdown_to_docx(&markdown, &StyleConfig::default()).unwrap();

    c.bench_function("detect_markdown", |b| {
        b.iter(|| docmark::detect_format_from_bytes(black_box(markdown.as_bytes())).unwrap());
    });

    c.bench_function("detect_docx", |b| {
        b.iter(|| docmark::detect_format_from_bytes(black_box(&docx)).unwrap());
    });
}

/// Benchmark Markdown parsing at various sizes.
fn bench_markup_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("markup_parsing");
    let style = StyleConfig::default();
    let options = ParseOptions::default();

    for sections in [1, 10, 100].iter() {
        let text = create_test_markdown(*sections);
        group.bench_function(format!("{}_sections", sections), |b| {
            b.iter(|| parse_markup(black_box(&text), &style, &options).unwrap());
        });
    }

    group.finish();
}

/// Benchmark both conversion directions end to end.
fn bench_conversion(c: &mut Criterion) {
    let style = StyleConfig::default();
    let text = create_test_markdown(20);
    let doc = parse_markup(&text, &style, &ParseOptions::default())
        .unwrap()
        .document;
    let docx = docmark::markdown_to_docx(&text, &style).unwrap();

    c.bench_function("render_native", |b| {
        b.iter(|| render_native(black_box(&doc), &style).unwrap());
    });

    c.bench_function("render_markdown", |b| {
        b.iter(|| to_markdown(black_box(&doc), &RenderOptions::default()).unwrap());
    });

    c.bench_function("markdown_to_docx", |b| {
        b.iter(|| docmark::markdown_to_docx(black_box(&text), &style).unwrap());
    });

    c.bench_function("docx_to_markdown", |b| {
        b.iter(|| docmark::docx_to_markdown(black_box(&docx)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_markup_parsing,
    bench_conversion,
);
criterion_main!(benches);

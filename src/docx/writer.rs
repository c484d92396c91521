//! DOCX package writer.
//!
//! Each part is built as a string and stored deflated in a ZIP archive held
//! in memory. Nothing touches the filesystem.

use super::{
    Border, BodyElement, Indent, NativeCell, NativeDocument, NativeParagraph, NativeRow,
    NativeTable, NumFormat, Numbering, ParagraphContent, ParagraphProps, Run, RunProps, Spacing,
    StyleDef, StyleKind, StyleSheet, VMerge, VertAlign,
};
use crate::error::Result;
use crate::model::{Alignment, Properties};
use std::borrow::Cow;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Usable text width of a Letter page with 1in margins.
const TEXT_WIDTH_TWIPS: usize = 9360;

/// Serialize a document as a DOCX package.
pub fn write_package(doc: &NativeDocument) -> Result<Vec<u8>> {
    let mut links = LinkTable::default();
    let document = document_xml(doc, &mut links);

    let parts = [
        ("[Content_Types].xml", content_types_xml()),
        ("_rels/.rels", package_rels_xml()),
        ("word/document.xml", document),
        ("word/styles.xml", styles_xml(&doc.styles)),
        ("word/numbering.xml", numbering_xml(&doc.numbering)),
        ("word/_rels/document.xml.rels", document_rels_xml(&links)),
        ("docProps/core.xml", core_xml(&doc.properties)),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in parts {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    let cursor = zip.finish()?;

    log::debug!(
        "wrote DOCX package: {} body elements, {} hyperlinks",
        doc.body.len(),
        links.targets.len()
    );
    Ok(cursor.into_inner())
}

/// External hyperlink targets, numbered after the fixed relationships.
#[derive(Default)]
struct LinkTable {
    targets: Vec<String>,
}

impl LinkTable {
    const FIRST_ID: usize = 3;

    fn id_for(&mut self, target: &str) -> String {
        let index = match self.targets.iter().position(|t| t == target) {
            Some(index) => index,
            None => {
                self.targets.push(target.to_string());
                self.targets.len() - 1
            }
        };
        format!("rId{}", index + Self::FIRST_ID)
    }
}

fn content_types_xml() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str("</Types>");
    xml
}

fn package_rels_xml() -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, REL_NS));
    xml.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{}/officeDocument" Target="word/document.xml"/>"#,
        REL_TYPE
    ));
    xml.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#);
    xml.push_str("</Relationships>");
    xml
}

fn document_rels_xml(links: &LinkTable) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, REL_NS));
    xml.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{}/styles" Target="styles.xml"/>"#,
        REL_TYPE
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId2" Type="{}/numbering" Target="numbering.xml"/>"#,
        REL_TYPE
    ));
    for (i, target) in links.targets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="{}/hyperlink" Target="{}" TargetMode="External"/>"#,
            i + LinkTable::FIRST_ID,
            REL_TYPE,
            escape(target.as_str())
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn core_xml(props: &Properties) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
        r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
    ));
    let text_fields = [
        ("dc:title", &props.title),
        ("dc:subject", &props.subject),
        ("dc:creator", &props.author),
        ("cp:keywords", &props.keywords),
    ];
    for (tag, value) in text_fields {
        if let Some(value) = value {
            xml.push_str(&format!("<{0}>{1}</{0}>", tag, escape(value.as_str())));
        }
    }
    let dates = [("dcterms:created", &props.created), ("dcterms:modified", &props.modified)];
    for (tag, value) in dates {
        if let Some(date) = value {
            xml.push_str(&format!(
                r#"<{0} xsi:type="dcterms:W3CDTF">{1}</{0}>"#,
                tag,
                date.format("%Y-%m-%dT%H:%M:%SZ")
            ));
        }
    }
    xml.push_str("</cp:coreProperties>");
    xml
}

fn document_xml(doc: &NativeDocument, links: &mut LinkTable) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(
        r#"<w:document xmlns:w="{}" xmlns:r="{}"><w:body>"#,
        W_NS, R_NS
    ));

    for element in &doc.body {
        match element {
            BodyElement::Paragraph(p) => write_paragraph(&mut xml, p, links),
            BodyElement::Table(t) => write_table(&mut xml, t, links),
            BodyElement::Unsupported(what) => {
                log::debug!("not writing unsupported element: {}", what);
            }
        }
    }

    xml.push_str(concat!(
        r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
        r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
        "</w:sectPr></w:body></w:document>"
    ));
    xml
}

fn write_paragraph(xml: &mut String, paragraph: &NativeParagraph, links: &mut LinkTable) {
    xml.push_str("<w:p>");
    write_paragraph_props(xml, &paragraph.props);
    for content in &paragraph.content {
        match content {
            ParagraphContent::Run(run) => write_run(xml, run),
            ParagraphContent::Hyperlink { target, runs } => {
                xml.push_str(&format!(r#"<w:hyperlink r:id="{}">"#, links.id_for(target)));
                for run in runs {
                    write_run(xml, run);
                }
                xml.push_str("</w:hyperlink>");
            }
            ParagraphContent::Unsupported(_) => {}
        }
    }
    xml.push_str("</w:p>");
}

fn write_paragraph_props(xml: &mut String, props: &ParagraphProps) {
    let mut inner = String::new();
    if let Some(style) = &props.style_id {
        inner.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape(style.as_str())));
    }
    if props.keep_next {
        inner.push_str("<w:keepNext/>");
    }
    if let Some(num) = props.numbering {
        inner.push_str(&format!(
            r#"<w:numPr><w:ilvl w:val="{}"/><w:numId w:val="{}"/></w:numPr>"#,
            num.level, num.num_id
        ));
    }
    if props.has_border() {
        inner.push_str("<w:pBdr>");
        if let Some(border) = &props.border_top {
            write_border(&mut inner, "top", border);
        }
        if let Some(border) = &props.border_bottom {
            write_border(&mut inner, "bottom", border);
        }
        inner.push_str("</w:pBdr>");
    }
    if let Some(color) = props.shading {
        inner.push_str(&format!(
            r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
            color.to_hex()
        ));
    }
    write_spacing(&mut inner, &props.spacing);
    write_indent(&mut inner, &props.indent);
    if let Some(alignment) = props.alignment {
        inner.push_str(&format!(r#"<w:jc w:val="{}"/>"#, alignment_value(alignment)));
    }

    if !inner.is_empty() {
        xml.push_str("<w:pPr>");
        xml.push_str(&inner);
        xml.push_str("</w:pPr>");
    }
}

fn write_border(xml: &mut String, side: &str, border: &Border) {
    let color = border
        .color
        .map(|c| c.to_hex())
        .unwrap_or_else(|| "auto".to_string());
    xml.push_str(&format!(
        r#"<w:{} w:val="{}" w:sz="{}" w:space="{}" w:color="{}"/>"#,
        side,
        escape(border.style.as_str()),
        border.size,
        border.space,
        color
    ));
}

fn write_spacing(xml: &mut String, spacing: &Spacing) {
    if *spacing == Spacing::default() {
        return;
    }
    xml.push_str("<w:spacing");
    if let Some(before) = spacing.before {
        xml.push_str(&format!(r#" w:before="{}""#, before));
    }
    if let Some(after) = spacing.after {
        xml.push_str(&format!(r#" w:after="{}""#, after));
    }
    if let Some(line) = spacing.line {
        xml.push_str(&format!(r#" w:line="{}" w:lineRule="auto""#, line));
    }
    xml.push_str("/>");
}

fn write_indent(xml: &mut String, indent: &Indent) {
    if *indent == Indent::default() {
        return;
    }
    xml.push_str("<w:ind");
    if let Some(left) = indent.left {
        xml.push_str(&format!(r#" w:left="{}""#, left));
    }
    if let Some(right) = indent.right {
        xml.push_str(&format!(r#" w:right="{}""#, right));
    }
    if let Some(first) = indent.first_line {
        xml.push_str(&format!(r#" w:firstLine="{}""#, first));
    }
    if let Some(hanging) = indent.hanging {
        xml.push_str(&format!(r#" w:hanging="{}""#, hanging));
    }
    xml.push_str("/>");
}

/// Whether XML 1.0 can store `c`.
pub fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// Escape text for XML, dropping characters XML 1.0 cannot store.
fn escape(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return quick_xml::escape::escape(text);
    }
    log::warn!("dropping control characters from {:?}", text);
    let kept: String = text.chars().filter(|c| is_xml_char(*c)).collect();
    Cow::Owned(quick_xml::escape::escape(kept.as_str()).into_owned())
}

fn alignment_value(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
        Alignment::Justify => "both",
    }
}

fn write_run(xml: &mut String, run: &Run) {
    xml.push_str("<w:r>");
    write_run_props(xml, &run.props);

    let mut text = String::new();
    let flush = |xml: &mut String, text: &mut String| {
        if !text.is_empty() {
            xml.push_str(&format!(
                r#"<w:t xml:space="preserve">{}</w:t>"#,
                escape(text.as_str())
            ));
            text.clear();
        }
    };
    for c in run.text.chars() {
        match c {
            '\n' => {
                flush(xml, &mut text);
                xml.push_str("<w:br/>");
            }
            '\t' => {
                flush(xml, &mut text);
                xml.push_str("<w:tab/>");
            }
            c => text.push(c),
        }
    }
    flush(xml, &mut text);
    xml.push_str("</w:r>");
}

fn write_run_props(xml: &mut String, props: &RunProps) {
    let mut inner = String::new();
    if let Some(style) = &props.style_id {
        inner.push_str(&format!(r#"<w:rStyle w:val="{}"/>"#, escape(style.as_str())));
    }
    if let Some(font) = &props.font {
        let font = escape(font.as_str());
        inner.push_str(&format!(
            r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#,
            font
        ));
    }
    if props.bold {
        inner.push_str("<w:b/>");
    }
    if props.italic {
        inner.push_str("<w:i/>");
    }
    if props.strike {
        inner.push_str("<w:strike/>");
    }
    if let Some(color) = props.color {
        inner.push_str(&format!(r#"<w:color w:val="{}"/>"#, color.to_hex()));
    }
    if let Some(size) = props.size {
        inner.push_str(&format!(r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, size));
    }
    if props.underline {
        inner.push_str(r#"<w:u w:val="single"/>"#);
    }
    if let Some(color) = props.shading {
        inner.push_str(&format!(
            r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
            color.to_hex()
        ));
    }
    match props.vert_align {
        VertAlign::Baseline => {}
        VertAlign::Superscript => inner.push_str(r#"<w:vertAlign w:val="superscript"/>"#),
        VertAlign::Subscript => inner.push_str(r#"<w:vertAlign w:val="subscript"/>"#),
    }

    if !inner.is_empty() {
        xml.push_str("<w:rPr>");
        xml.push_str(&inner);
        xml.push_str("</w:rPr>");
    }
}

fn write_table(xml: &mut String, table: &NativeTable, links: &mut LinkTable) {
    let columns = table
        .rows
        .iter()
        .map(|r| r.cells.iter().map(|c| c.grid_span.max(1) as usize).sum::<usize>())
        .max()
        .unwrap_or(0)
        .max(table.column_count)
        .max(1);

    xml.push_str("<w:tbl><w:tblPr>");
    if let Some(style) = &table.style_id {
        xml.push_str(&format!(r#"<w:tblStyle w:val="{}"/>"#, escape(style.as_str())));
    }
    xml.push_str(r#"<w:tblW w:w="0" w:type="auto"/>"#);
    let layout = if table.autofit { "autofit" } else { "fixed" };
    xml.push_str(&format!(r#"<w:tblLayout w:type="{}"/>"#, layout));
    xml.push_str(r#"<w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/>"#);
    xml.push_str("</w:tblPr><w:tblGrid>");
    let width = TEXT_WIDTH_TWIPS / columns;
    for _ in 0..columns {
        xml.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, width));
    }
    xml.push_str("</w:tblGrid>");

    for row in &table.rows {
        write_row(xml, row, width, links);
    }
    xml.push_str("</w:tbl>");
}

fn write_row(xml: &mut String, row: &NativeRow, width: usize, links: &mut LinkTable) {
    xml.push_str("<w:tr>");
    if row.is_header {
        xml.push_str("<w:trPr><w:tblHeader/></w:trPr>");
    }
    for cell in &row.cells {
        write_cell(xml, cell, width, links);
    }
    xml.push_str("</w:tr>");
}

fn write_cell(xml: &mut String, cell: &NativeCell, width: usize, links: &mut LinkTable) {
    let span = cell.grid_span.max(1);
    xml.push_str("<w:tc><w:tcPr>");
    xml.push_str(&format!(
        r#"<w:tcW w:w="{}" w:type="dxa"/>"#,
        width * span as usize
    ));
    if span > 1 {
        xml.push_str(&format!(r#"<w:gridSpan w:val="{}"/>"#, span));
    }
    match cell.v_merge {
        Some(VMerge::Restart) => xml.push_str(r#"<w:vMerge w:val="restart"/>"#),
        Some(VMerge::Continue) => xml.push_str("<w:vMerge/>"),
        None => {}
    }
    xml.push_str("</w:tcPr>");

    if cell.paragraphs.is_empty() {
        xml.push_str("<w:p/>");
    }
    for paragraph in &cell.paragraphs {
        write_paragraph(xml, paragraph, links);
    }
    xml.push_str("</w:tc>");
}

fn styles_xml(sheet: &StyleSheet) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(r#"<w:styles xmlns:w="{}">"#, W_NS));

    xml.push_str("<w:docDefaults><w:rPrDefault>");
    write_run_props(&mut xml, &sheet.default_run);
    xml.push_str("</w:rPrDefault><w:pPrDefault>");
    write_paragraph_props(&mut xml, &sheet.default_paragraph);
    xml.push_str("</w:pPrDefault></w:docDefaults>");

    for style in &sheet.styles {
        write_style(&mut xml, style);
    }
    xml.push_str("</w:styles>");
    xml
}

fn write_style(xml: &mut String, style: &StyleDef) {
    let default = if style.id == "Normal" || style.id == "TableNormal" {
        r#" w:default="1""#
    } else {
        ""
    };
    xml.push_str(&format!(
        r#"<w:style w:type="{}"{} w:styleId="{}">"#,
        style.kind.as_str(),
        default,
        escape(style.id.as_str())
    ));
    xml.push_str(&format!(r#"<w:name w:val="{}"/>"#, escape(style.name.as_str())));
    if let Some(base) = &style.based_on {
        xml.push_str(&format!(r#"<w:basedOn w:val="{}"/>"#, escape(base.as_str())));
    }
    if let Some(next) = &style.next {
        xml.push_str(&format!(r#"<w:next w:val="{}"/>"#, escape(next.as_str())));
    }
    xml.push_str("<w:qFormat/>");
    if style.kind != StyleKind::Character {
        write_paragraph_props(xml, &style.paragraph);
    }
    write_run_props(xml, &style.run);
    if style.kind == StyleKind::Table {
        xml.push_str("<w:tblPr><w:tblBorders>");
        for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
            xml.push_str(&format!(
                r#"<w:{} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
                side
            ));
        }
        xml.push_str("</w:tblBorders></w:tblPr>");
    }
    xml.push_str("</w:style>");
}

fn numbering_xml(numbering: &Numbering) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(&format!(r#"<w:numbering xmlns:w="{}">"#, W_NS));

    for abstract_num in &numbering.abstracts {
        xml.push_str(&format!(
            r#"<w:abstractNum w:abstractNumId="{}"><w:multiLevelType w:val="hybridMultilevel"/>"#,
            abstract_num.id
        ));
        for level in &abstract_num.levels {
            xml.push_str(&format!(
                r#"<w:lvl w:ilvl="{}"><w:start w:val="{}"/><w:numFmt w:val="{}"/><w:lvlText w:val="{}"/><w:lvlJc w:val="left"/>"#,
                level.level,
                level.start,
                escape(level.format.as_str()),
                escape(level.text.as_str())
            ));
            xml.push_str(&format!(
                r#"<w:pPr><w:ind w:left="{}" w:hanging="360"/></w:pPr>"#,
                level.indent
            ));
            if level.format == NumFormat::Bullet {
                xml.push_str(r#"<w:rPr><w:rFonts w:ascii="Symbol" w:hAnsi="Symbol" w:hint="default"/></w:rPr>"#);
            }
            xml.push_str("</w:lvl>");
        }
        xml.push_str("</w:abstractNum>");
    }

    for instance in &numbering.instances {
        xml.push_str(&format!(
            r#"<w:num w:numId="{}"><w:abstractNumId w:val="{}"/>"#,
            instance.id, instance.abstract_id
        ));
        for (level, start) in &instance.start_overrides {
            xml.push_str(&format!(
                r#"<w:lvlOverride w:ilvl="{}"><w:startOverride w:val="{}"/></w:lvlOverride>"#,
                level, start
            ));
        }
        xml.push_str("</w:num>");
    }

    xml.push_str("</w:numbering>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::NumberingRef;
    use std::io::Read;

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn test_package_parts() {
        let bytes = write_package(&NativeDocument::new()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for expected in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/numbering.xml",
            "word/_rels/document.xml.rels",
            "docProps/core.xml",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_text_is_escaped() {
        let mut doc = NativeDocument::new();
        let mut p = NativeParagraph::default();
        p.push_run(Run::plain("a < b & \"c\""));
        doc.push_paragraph(p);

        let xml = part(&write_package(&doc).unwrap(), "word/document.xml");
        assert!(xml.contains("a &lt; b &amp; &quot;c&quot;"));
    }

    #[test]
    fn test_control_characters_dropped() {
        let mut doc = NativeDocument::new();
        let mut p = NativeParagraph::default();
        p.push_run(Run::plain("a\u{1b}[0mb\u{0}c\u{b}"));
        doc.push_paragraph(p);

        let xml = part(&write_package(&doc).unwrap(), "word/document.xml");
        assert!(xml.contains(">a[0mbc</w:t>"));
        assert!(!xml.contains('\u{1b}'));
        assert!(!xml.contains('\u{0}'));
    }

    #[test]
    fn test_xml_chars() {
        assert!(is_xml_char('a'));
        assert!(is_xml_char('\t'));
        assert!(is_xml_char('é'));
        assert!(!is_xml_char('\u{1b}'));
        assert!(!is_xml_char('\u{c}'));
        assert!(!is_xml_char('\u{FFFE}'));
    }

    #[test]
    fn test_breaks_and_tabs() {
        let mut xml = String::new();
        write_run(&mut xml, &Run::plain("one\ntwo\tthree"));
        assert!(xml.contains(r#"one</w:t><w:br/><w:t xml:space="preserve">two</w:t><w:tab/>"#));
    }

    #[test]
    fn test_border_and_numbering_props() {
        let props = ParagraphProps {
            border_bottom: Some(Border::single(6)),
            numbering: Some(NumberingRef { num_id: 2, level: 1 }),
            spacing: Spacing::around(60),
            ..Default::default()
        };
        let mut xml = String::new();
        write_paragraph_props(&mut xml, &props);
        assert!(xml.contains(r#"<w:ilvl w:val="1"/><w:numId w:val="2"/>"#));
        assert!(xml.contains(r#"<w:bottom w:val="single" w:sz="6""#));
        assert!(xml.contains(r#"w:before="60" w:after="60""#));
    }

    #[test]
    fn test_hyperlink_relationships() {
        let mut doc = NativeDocument::new();
        let mut p = NativeParagraph::default();
        for _ in 0..2 {
            p.content.push(ParagraphContent::Hyperlink {
                target: "https://example.com/?a=1&b=2".into(),
                runs: vec![Run::plain("link")],
            });
        }
        doc.push_paragraph(p);

        let bytes = write_package(&doc).unwrap();
        let rels = part(&bytes, "word/_rels/document.xml.rels");
        assert_eq!(rels.matches("TargetMode=\"External\"").count(), 1);
        assert!(rels.contains("a=1&amp;b=2"));
        assert!(part(&bytes, "word/document.xml").contains(r#"<w:hyperlink r:id="rId3">"#));
    }

    #[test]
    fn test_empty_cell_gets_paragraph() {
        let table = NativeTable {
            rows: vec![NativeRow {
                is_header: true,
                cells: vec![NativeCell::default()],
            }],
            ..Default::default()
        };
        let mut xml = String::new();
        write_table(&mut xml, &table, &mut LinkTable::default());
        assert!(xml.contains("<w:tblHeader/>"));
        assert!(xml.contains("<w:p/>"));
    }
}

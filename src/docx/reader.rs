//! DOCX package reader.
//!
//! Parts are read fully into memory and walked with a pull parser. Only the
//! subset of WordprocessingML that [`NativeDocument`] models is kept;
//! drawings, embedded objects and header/footer references are recorded as
//! unsupported so the extractor can report them.

use super::{
    AbstractNum, BodyElement, Border, NativeCell, NativeDocument, NativeParagraph, NativeRow,
    NativeTable, NumFormat, NumInstance, NumLevel, Numbering, NumberingRef, ParagraphContent,
    ParagraphProps, Run, RunProps, StyleDef, StyleKind, StyleSheet, VMerge, VertAlign,
};
use crate::error::{Error, Result};
use crate::model::{Alignment, Properties};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::result::ZipError;
use zip::ZipArchive;

/// Parse a DOCX package.
pub fn read_package(data: &[u8]) -> Result<NativeDocument> {
    let mut archive = ZipArchive::new(Cursor::new(data))
        .map_err(|e| Error::MalformedInput(format!("not a DOCX package: {}", e)))?;

    let document = read_part(&mut archive, "word/document.xml")?
        .ok_or_else(|| Error::MalformedInput("missing word/document.xml".into()))?;
    let relationships = match read_part(&mut archive, "word/_rels/document.xml.rels")? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };
    let styles = match read_part(&mut archive, "word/styles.xml")? {
        Some(xml) => parse_styles(&xml)?,
        None => StyleSheet::default(),
    };
    let numbering = match read_part(&mut archive, "word/numbering.xml")? {
        Some(xml) => parse_numbering(&xml)?,
        None => Numbering::default(),
    };
    let properties = match read_part(&mut archive, "docProps/core.xml")? {
        Some(xml) => parse_core(&xml)?,
        None => Properties::default(),
    };

    let body = parse_body(&document, &relationships)?;
    log::debug!(
        "read DOCX package: {} body elements, {} styles, {} numbering instances",
        body.len(),
        styles.styles.len(),
        numbering.instances.len()
    );

    Ok(NativeDocument {
        body,
        styles,
        numbering,
        properties,
    })
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    file.read_to_string(&mut content).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            Error::MalformedInput(format!("{} is not valid UTF-8", name))
        }
        _ => Error::Io(e),
    })?;
    Ok(Some(content))
}

fn malformed(part: &str, err: quick_xml::Error) -> Error {
    Error::MalformedInput(format!("{}: {}", part, err))
}

/// Extract an attribute value by qualified name.
fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Option<u32> {
    attr(e, key).and_then(|v| v.trim().parse().ok())
}

/// Toggle properties such as `<w:b/>` are on unless `w:val` says otherwise.
fn toggle(e: &BytesStart<'_>) -> bool {
    !matches!(attr(e, b"w:val").as_deref(), Some("0" | "false" | "off" | "none"))
}

fn parse_alignment(value: &str) -> Option<Alignment> {
    match value {
        "left" | "start" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" | "end" => Some(Alignment::Right),
        "both" | "distribute" => Some(Alignment::Justify),
        _ => None,
    }
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>> {
    let mut relationships = HashMap::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attr(&e, b"Id"), attr(&e, b"Target")) {
                    relationships.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed("word/_rels/document.xml.rels", e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(relationships)
}

/// Which property container the cursor is inside.
#[derive(Default)]
struct PropsScope {
    in_ppr: bool,
    in_rpr: bool,
    in_pbdr: bool,
}

impl PropsScope {
    fn start(&mut self, name: &[u8]) {
        match name {
            b"w:pPr" => self.in_ppr = true,
            b"w:rPr" => self.in_rpr = true,
            b"w:pBdr" => self.in_pbdr = true,
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:pPr" => self.in_ppr = false,
            b"w:rPr" => self.in_rpr = false,
            b"w:pBdr" => self.in_pbdr = false,
            _ => {}
        }
    }
}

/// Apply one child element of `w:pPr`.
fn apply_paragraph_prop(props: &mut ParagraphProps, e: &BytesStart<'_>, in_pbdr: bool) {
    match e.name().as_ref() {
        b"w:pStyle" => props.style_id = attr(e, b"w:val"),
        b"w:jc" => props.alignment = attr(e, b"w:val").as_deref().and_then(parse_alignment),
        b"w:keepNext" => props.keep_next = toggle(e),
        b"w:top" if in_pbdr => props.border_top = parse_border(e),
        b"w:bottom" if in_pbdr => props.border_bottom = parse_border(e),
        b"w:spacing" => {
            props.spacing.before = attr_u32(e, b"w:before");
            props.spacing.after = attr_u32(e, b"w:after");
            props.spacing.line = attr_u32(e, b"w:line");
        }
        b"w:ind" => {
            props.indent.left = attr_u32(e, b"w:left").or_else(|| attr_u32(e, b"w:start"));
            props.indent.right = attr_u32(e, b"w:right").or_else(|| attr_u32(e, b"w:end"));
            props.indent.first_line = attr_u32(e, b"w:firstLine");
            props.indent.hanging = attr_u32(e, b"w:hanging");
        }
        b"w:ilvl" => {
            let level = attr_u32(e, b"w:val").unwrap_or(0);
            let reference = props.numbering.get_or_insert(NumberingRef { num_id: 0, level: 0 });
            reference.level = u8::try_from(level).unwrap_or(u8::MAX);
        }
        b"w:numId" => {
            let num_id = attr_u32(e, b"w:val").unwrap_or(0);
            let reference = props.numbering.get_or_insert(NumberingRef { num_id: 0, level: 0 });
            reference.num_id = num_id;
        }
        b"w:shd" => props.shading = attr(e, b"w:fill").and_then(|f| f.parse().ok()),
        _ => {}
    }
}

fn parse_border(e: &BytesStart<'_>) -> Option<Border> {
    let style = attr(e, b"w:val")?;
    if style == "nil" || style == "none" {
        return None;
    }
    Some(Border {
        style,
        size: attr_u32(e, b"w:sz").unwrap_or(4),
        color: attr(e, b"w:color").and_then(|c| c.parse().ok()),
        space: attr_u32(e, b"w:space").unwrap_or(0),
    })
}

/// Apply one child element of `w:rPr`.
fn apply_run_prop(props: &mut RunProps, e: &BytesStart<'_>) {
    match e.name().as_ref() {
        b"w:rStyle" => props.style_id = attr(e, b"w:val"),
        b"w:b" => props.bold = toggle(e),
        b"w:i" => props.italic = toggle(e),
        b"w:strike" | b"w:dstrike" => props.strike = toggle(e),
        b"w:u" => props.underline = toggle(e),
        b"w:vertAlign" => {
            props.vert_align = match attr(e, b"w:val").as_deref() {
                Some("superscript") => VertAlign::Superscript,
                Some("subscript") => VertAlign::Subscript,
                _ => VertAlign::Baseline,
            }
        }
        b"w:rFonts" => {
            props.font = attr(e, b"w:ascii")
                .or_else(|| attr(e, b"w:hAnsi"))
                .or_else(|| attr(e, b"w:cs"));
        }
        b"w:sz" => props.size = attr_u32(e, b"w:val"),
        b"w:color" => props.color = attr(e, b"w:val").and_then(|c| c.parse().ok()),
        b"w:shd" => props.shading = attr(e, b"w:fill").and_then(|f| f.parse().ok()),
        _ => {}
    }
}

fn parse_styles(xml: &str) -> Result<StyleSheet> {
    let mut sheet = StyleSheet::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut scope = PropsScope::default();
    let mut in_defaults = false;
    let mut current: Option<StyleDef> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed("word/styles.xml", e))?;
        match event {
            Event::Start(e) => {
                let name = e.name();
                scope.start(name.as_ref());
                match name.as_ref() {
                    b"w:docDefaults" => in_defaults = true,
                    b"w:style" => current = Some(style_header(&e)),
                    _ => {}
                }
                apply_style_prop(&mut sheet, current.as_mut(), in_defaults, &scope, &e);
            }
            Event::Empty(e) if e.name().as_ref() == b"w:style" => sheet.insert(style_header(&e)),
            Event::Empty(e) => {
                apply_style_prop(&mut sheet, current.as_mut(), in_defaults, &scope, &e)
            }
            Event::End(e) => {
                scope.end(e.name().as_ref());
                match e.name().as_ref() {
                    b"w:docDefaults" => in_defaults = false,
                    b"w:style" => {
                        if let Some(style) = current.take() {
                            sheet.insert(style);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(sheet)
}

fn style_header(e: &BytesStart<'_>) -> StyleDef {
    let kind = match attr(e, b"w:type").as_deref() {
        Some("character") => StyleKind::Character,
        Some("table") => StyleKind::Table,
        _ => StyleKind::Paragraph,
    };
    let id = attr(e, b"w:styleId").unwrap_or_default();
    StyleDef::new(id.clone(), id, kind)
}

fn apply_style_prop(
    sheet: &mut StyleSheet,
    current: Option<&mut StyleDef>,
    in_defaults: bool,
    scope: &PropsScope,
    e: &BytesStart<'_>,
) {
    match current {
        Some(style) => match e.name().as_ref() {
            b"w:name" => {
                if let Some(name) = attr(e, b"w:val") {
                    style.name = name;
                }
            }
            b"w:basedOn" => style.based_on = attr(e, b"w:val"),
            b"w:next" => style.next = attr(e, b"w:val"),
            _ if scope.in_rpr => apply_run_prop(&mut style.run, e),
            _ if scope.in_ppr => apply_paragraph_prop(&mut style.paragraph, e, scope.in_pbdr),
            _ => {}
        },
        None if in_defaults && scope.in_rpr => apply_run_prop(&mut sheet.default_run, e),
        None if in_defaults && scope.in_ppr => {
            apply_paragraph_prop(&mut sheet.default_paragraph, e, scope.in_pbdr)
        }
        None => {}
    }
}

fn parse_numbering(xml: &str) -> Result<Numbering> {
    let mut numbering = Numbering::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut abstract_num: Option<AbstractNum> = None;
    let mut level: Option<NumLevel> = None;
    let mut instance: Option<NumInstance> = None;
    let mut override_level: Option<u8> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed("word/numbering.xml", e))?;
        match event {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"w:abstractNum" => {
                    abstract_num = Some(AbstractNum {
                        id: attr_u32(&e, b"w:abstractNumId").unwrap_or(0),
                        levels: Vec::new(),
                    });
                }
                b"w:lvl" if abstract_num.is_some() => {
                    let ilvl = attr_u32(&e, b"w:ilvl").unwrap_or(0);
                    level = Some(NumLevel {
                        level: u8::try_from(ilvl).unwrap_or(u8::MAX),
                        format: NumFormat::Decimal,
                        text: String::new(),
                        start: 1,
                        indent: 0,
                    });
                }
                b"w:start" => {
                    if let Some(level) = level.as_mut() {
                        level.start = attr_u32(&e, b"w:val").unwrap_or(1);
                    }
                }
                b"w:numFmt" => {
                    if let Some(level) = level.as_mut() {
                        level.format = NumFormat::parse(&attr(&e, b"w:val").unwrap_or_default());
                    }
                }
                b"w:lvlText" => {
                    if let Some(level) = level.as_mut() {
                        level.text = attr(&e, b"w:val").unwrap_or_default();
                    }
                }
                b"w:ind" => {
                    if let Some(level) = level.as_mut() {
                        level.indent = attr_u32(&e, b"w:left")
                            .or_else(|| attr_u32(&e, b"w:start"))
                            .unwrap_or(0);
                    }
                }
                b"w:num" => {
                    instance = Some(NumInstance {
                        id: attr_u32(&e, b"w:numId").unwrap_or(0),
                        abstract_id: 0,
                        start_overrides: Vec::new(),
                    });
                }
                b"w:abstractNumId" => {
                    if let Some(instance) = instance.as_mut() {
                        instance.abstract_id = attr_u32(&e, b"w:val").unwrap_or(0);
                    }
                }
                b"w:lvlOverride" => {
                    override_level = attr_u32(&e, b"w:ilvl").and_then(|l| u8::try_from(l).ok());
                }
                b"w:startOverride" => {
                    if let (Some(instance), Some(lvl)) = (instance.as_mut(), override_level) {
                        let start = attr_u32(&e, b"w:val").unwrap_or(1);
                        instance.start_overrides.push((lvl, start));
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:lvl" => {
                    if let (Some(parent), Some(done)) = (abstract_num.as_mut(), level.take()) {
                        parent.levels.push(done);
                    }
                }
                b"w:abstractNum" => {
                    if let Some(done) = abstract_num.take() {
                        numbering.abstracts.push(done);
                    }
                }
                b"w:lvlOverride" => override_level = None,
                b"w:num" => {
                    if let Some(done) = instance.take() {
                        numbering.instances.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(numbering)
}

fn parse_core(xml: &str) -> Result<Properties> {
    let mut properties = Properties::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut field: Option<Vec<u8>> = None;
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed("docProps/core.xml", e))?;
        match event {
            Event::Start(e) => field = Some(e.name().as_ref().to_vec()),
            Event::Text(t) => {
                let Some(name) = field.as_deref() else {
                    continue;
                };
                let text = t
                    .unescape()
                    .map_err(|e| malformed("docProps/core.xml", e))?
                    .trim()
                    .to_string();
                if text.is_empty() {
                    continue;
                }
                match name {
                    b"dc:title" => properties.title = Some(text),
                    b"dc:creator" => properties.author = Some(text),
                    b"dc:subject" => properties.subject = Some(text),
                    b"cp:keywords" => properties.keywords = Some(text),
                    b"dcterms:created" => properties.created = parse_date(&text),
                    b"dcterms:modified" => properties.modified = parse_date(&text),
                    _ => {}
                }
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(properties)
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Elements whose whole subtree is skipped and reported.
fn unsupported_inline(name: &[u8]) -> Option<&'static str> {
    match name {
        b"w:drawing" | b"w:pict" => Some("drawing"),
        b"w:object" => Some("embedded object"),
        b"mc:AlternateContent" => Some("alternate content"),
        _ => None,
    }
}

#[derive(Default)]
struct TableFrame {
    table: NativeTable,
    row: Option<NativeRow>,
    cell: Option<NativeCell>,
    in_tcpr: bool,
}

/// Walk state for `word/document.xml`.
struct BodyWalker<'r> {
    relationships: &'r HashMap<String, String>,
    body: Vec<BodyElement>,
    tables: Vec<TableFrame>,
    paragraph: Option<NativeParagraph>,
    hyperlink: Option<(Option<String>, Vec<Run>)>,
    run: Option<Run>,
    scope: PropsScope,
    in_text: bool,
    skip_depth: usize,
}

fn parse_body(xml: &str, relationships: &HashMap<String, String>) -> Result<Vec<BodyElement>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut walker = BodyWalker {
        relationships,
        body: Vec::new(),
        tables: Vec::new(),
        paragraph: None,
        hyperlink: None,
        run: None,
        scope: PropsScope::default(),
        in_text: false,
        skip_depth: 0,
    };

    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed("word/document.xml", e))?;

        if walker.skip_depth > 0 {
            match event {
                Event::Start(_) => walker.skip_depth += 1,
                Event::End(_) => walker.skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
            continue;
        }

        match event {
            Event::Start(e) => walker.start(&e),
            Event::Empty(e) => walker.empty(&e),
            Event::Text(t) if walker.in_text => {
                let text = t.unescape().map_err(|e| malformed("word/document.xml", e))?;
                if let Some(run) = walker.run.as_mut() {
                    run.text.push_str(&text);
                }
            }
            Event::End(e) => walker.end(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(walker.body)
}

impl BodyWalker<'_> {
    fn start(&mut self, e: &BytesStart<'_>) {
        let name = e.name();
        let name = name.as_ref();

        if let Some(what) = unsupported_inline(name) {
            self.unsupported(what);
            self.skip_depth = 1;
            return;
        }

        self.scope.start(name);
        match name {
            b"w:tbl" => self.tables.push(TableFrame {
                table: NativeTable {
                    autofit: true,
                    ..Default::default()
                },
                ..Default::default()
            }),
            b"w:tr" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.row = Some(NativeRow::default());
                }
            }
            b"w:tc" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.cell = Some(NativeCell::default());
                }
            }
            b"w:tcPr" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.in_tcpr = true;
                }
            }
            b"w:p" => self.paragraph = Some(NativeParagraph::default()),
            b"w:hyperlink" => {
                let target = attr(e, b"r:id").and_then(|id| self.relationships.get(&id).cloned());
                self.hyperlink = Some((target, Vec::new()));
            }
            b"w:r" => self.run = Some(Run::default()),
            b"w:t" => self.in_text = self.run.is_some(),
            _ => self.property(e),
        }
    }

    fn empty(&mut self, e: &BytesStart<'_>) {
        let name = e.name();
        match name.as_ref() {
            b"w:p" => {
                self.paragraph = Some(NativeParagraph::default());
                self.end(b"w:p");
            }
            b"w:tc" => {
                if let Some(frame) = self.tables.last_mut() {
                    if let Some(row) = frame.row.as_mut() {
                        row.cells.push(NativeCell::default());
                    }
                }
            }
            b"w:br" | b"w:cr" if !self.scope.in_rpr => self.push_char('\n'),
            b"w:tab" if !self.scope.in_ppr => self.push_char('\t'),
            b"w:headerReference" => self.body.push(BodyElement::Unsupported("header reference".into())),
            b"w:footerReference" => self.body.push(BodyElement::Unsupported("footer reference".into())),
            other => {
                if let Some(what) = unsupported_inline(other) {
                    self.unsupported(what);
                } else {
                    self.property(e);
                }
            }
        }
    }

    fn property(&mut self, e: &BytesStart<'_>) {
        let name = e.name();
        let name = name.as_ref();

        if let Some(frame) = self.tables.last_mut() {
            match name {
                b"w:tblStyle" => frame.table.style_id = attr(e, b"w:val"),
                b"w:tblLayout" => {
                    frame.table.autofit = attr(e, b"w:type").as_deref() != Some("fixed")
                }
                b"w:gridCol" => frame.table.column_count += 1,
                b"w:tblHeader" => {
                    if let Some(row) = frame.row.as_mut() {
                        row.is_header = toggle(e);
                    }
                }
                b"w:gridSpan" if frame.in_tcpr => {
                    if let Some(cell) = frame.cell.as_mut() {
                        cell.grid_span = attr_u32(e, b"w:val").unwrap_or(1).max(1);
                    }
                }
                b"w:vMerge" if frame.in_tcpr => {
                    if let Some(cell) = frame.cell.as_mut() {
                        cell.v_merge = Some(match attr(e, b"w:val").as_deref() {
                            Some("restart") => VMerge::Restart,
                            _ => VMerge::Continue,
                        });
                    }
                }
                _ => {}
            }
            if frame.in_tcpr {
                return;
            }
        }

        if self.scope.in_ppr {
            // Paragraph-mark run properties do not apply to any run.
            if self.scope.in_rpr {
                return;
            }
            if let Some(paragraph) = self.paragraph.as_mut() {
                apply_paragraph_prop(&mut paragraph.props, e, self.scope.in_pbdr);
            }
        } else if self.scope.in_rpr {
            if let Some(run) = self.run.as_mut() {
                apply_run_prop(&mut run.props, e);
            }
        }
    }

    fn end(&mut self, name: &[u8]) {
        self.scope.end(name);
        match name {
            b"w:t" => self.in_text = false,
            b"w:r" => {
                if let Some(run) = self.run.take() {
                    match self.hyperlink.as_mut() {
                        Some((_, runs)) => runs.push(run),
                        None => self.push_content(ParagraphContent::Run(run)),
                    }
                }
            }
            b"w:hyperlink" => {
                if let Some((target, runs)) = self.hyperlink.take() {
                    match target {
                        Some(target) => self.push_content(ParagraphContent::Hyperlink { target, runs }),
                        // Internal anchors keep their text only.
                        None => runs
                            .into_iter()
                            .for_each(|run| self.push_content(ParagraphContent::Run(run))),
                    }
                }
            }
            b"w:p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    match self.tables.last_mut().and_then(|f| f.cell.as_mut()) {
                        Some(cell) => cell.paragraphs.push(paragraph),
                        None => self.body.push(BodyElement::Paragraph(paragraph)),
                    }
                }
            }
            b"w:tcPr" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.in_tcpr = false;
                }
            }
            b"w:tc" => {
                if let Some(frame) = self.tables.last_mut() {
                    if let (Some(row), Some(cell)) = (frame.row.as_mut(), frame.cell.take()) {
                        row.cells.push(cell);
                    }
                }
            }
            b"w:tr" => {
                if let Some(frame) = self.tables.last_mut() {
                    if let Some(row) = frame.row.take() {
                        frame.table.rows.push(row);
                    }
                }
            }
            b"w:tbl" => self.close_table(),
            _ => {}
        }
    }

    fn close_table(&mut self) {
        let Some(frame) = self.tables.pop() else {
            return;
        };
        match self.tables.last_mut().and_then(|f| f.cell.as_mut()) {
            Some(outer) => {
                // Nested tables are flattened into the enclosing cell.
                log::debug!("flattening nested table into its cell");
                for row in frame.table.rows {
                    for cell in row.cells {
                        outer.paragraphs.extend(cell.paragraphs);
                    }
                }
            }
            None => self.body.push(BodyElement::Table(frame.table)),
        }
    }

    fn push_char(&mut self, c: char) {
        if let Some(run) = self.run.as_mut() {
            run.text.push(c);
        }
    }

    fn push_content(&mut self, content: ParagraphContent) {
        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.content.push(content);
        }
    }

    fn unsupported(&mut self, what: &str) {
        match self.paragraph.as_mut() {
            Some(paragraph) => paragraph
                .content
                .push(ParagraphContent::Unsupported(what.to_string())),
            None => self.body.push(BodyElement::Unsupported(what.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::{write_package, Spacing};
    use crate::style::RgbColor;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#;

    fn body(inner: &str) -> Vec<BodyElement> {
        let xml = format!("<w:document {}><w:body>{}</w:body></w:document>", W, inner);
        let mut rels = HashMap::new();
        rels.insert("rId9".to_string(), "https://example.com".to_string());
        parse_body(&xml, &rels).unwrap()
    }

    fn first_paragraph(elements: &[BodyElement]) -> &NativeParagraph {
        match &elements[0] {
            BodyElement::Paragraph(p) => p,
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn test_runs_and_properties() {
        let elements = body(concat!(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/>"#,
            r#"<w:rPr><w:b/></w:rPr></w:pPr>"#,
            r#"<w:r><w:rPr><w:b/><w:sz w:val="28"/></w:rPr><w:t xml:space="preserve">Hello </w:t></w:r>"#,
            r#"<w:r><w:rPr><w:i w:val="0"/></w:rPr><w:t>world</w:t><w:br/><w:t>again</w:t></w:r></w:p>"#
        ));
        let p = first_paragraph(&elements);
        assert_eq!(p.props.style_id.as_deref(), Some("Heading1"));
        assert_eq!(p.props.alignment, Some(Alignment::Center));
        assert_eq!(p.text(), "Hello world\nagain");

        let runs: Vec<&Run> = p.runs().collect();
        assert!(runs[0].props.bold);
        assert_eq!(runs[0].props.size, Some(28));
        assert!(!runs[1].props.bold);
        assert!(!runs[1].props.italic);
    }

    #[test]
    fn test_borders_and_numbering() {
        let elements = body(concat!(
            r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="2"/><w:numId w:val="4"/></w:numPr>"#,
            r#"<w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="auto"/></w:pBdr></w:pPr></w:p>"#
        ));
        let p = first_paragraph(&elements);
        assert_eq!(p.props.numbering, Some(NumberingRef { num_id: 4, level: 2 }));
        let border = p.props.border_bottom.as_ref().unwrap();
        assert_eq!(border.size, 6);
        assert_eq!(border.color, None);
        assert!(p.props.border_top.is_none());
    }

    #[test]
    fn test_hyperlinks() {
        let elements = body(concat!(
            r#"<w:p><w:hyperlink r:id="rId9"><w:r><w:t>site</w:t></w:r></w:hyperlink>"#,
            r#"<w:hyperlink w:anchor="_Toc1"><w:r><w:t> internal</w:t></w:r></w:hyperlink></w:p>"#
        ));
        let p = first_paragraph(&elements);
        assert_eq!(p.content.len(), 2);
        assert!(matches!(
            &p.content[0],
            ParagraphContent::Hyperlink { target, .. } if target == "https://example.com"
        ));
        assert!(matches!(&p.content[1], ParagraphContent::Run(_)));
    }

    #[test]
    fn test_drawing_is_skipped() {
        let elements = body(concat!(
            r#"<w:p><w:r><w:t>before</w:t></w:r><w:r><w:drawing><wp:inline>"#,
            r#"<w:txbxContent><w:p><w:r><w:t>inside</w:t></w:r></w:p></w:txbxContent>"#,
            r#"</wp:inline></w:drawing></w:r></w:p>"#
        ));
        assert_eq!(elements.len(), 1);
        let p = first_paragraph(&elements);
        assert_eq!(p.text(), "before");
        assert!(p
            .content
            .iter()
            .any(|c| matches!(c, ParagraphContent::Unsupported(w) if w == "drawing")));
    }

    #[test]
    fn test_table_merges() {
        let elements = body(concat!(
            "<w:tbl><w:tblPr><w:tblStyle w:val=\"TableGrid\"/></w:tblPr>",
            "<w:tblGrid><w:gridCol/><w:gridCol/><w:gridCol/></w:tblGrid>",
            "<w:tr><w:trPr><w:tblHeader/></w:trPr>",
            "<w:tc><w:tcPr><w:gridSpan w:val=\"2\"/></w:tcPr><w:p><w:r><w:t>wide</w:t></w:r></w:p></w:tc>",
            "<w:tc><w:tcPr><w:vMerge w:val=\"restart\"/></w:tcPr><w:p><w:r><w:t>tall</w:t></w:r></w:p></w:tc></w:tr>",
            "<w:tr><w:tc><w:p/></w:tc><w:tc><w:p/></w:tc>",
            "<w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc></w:tr></w:tbl>"
        ));
        let BodyElement::Table(table) = &elements[0] else {
            panic!("expected table");
        };
        assert_eq!(table.style_id.as_deref(), Some("TableGrid"));
        assert_eq!(table.column_count, 3);
        assert!(table.rows[0].is_header);
        assert_eq!(table.rows[0].cells[0].grid_span, 2);
        assert_eq!(table.rows[0].cells[1].v_merge, Some(VMerge::Restart));
        assert_eq!(table.rows[1].cells[2].v_merge, Some(VMerge::Continue));
        assert_eq!(table.rows[1].cells.len(), 3);
    }

    #[test]
    fn test_header_reference_recorded() {
        let elements = body(r#"<w:sectPr><w:headerReference w:type="default" r:id="rId1"/></w:sectPr>"#);
        assert_eq!(
            elements,
            vec![BodyElement::Unsupported("header reference".into())]
        );
    }

    #[test]
    fn test_not_a_package() {
        let err = read_package(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_broken_xml_is_malformed() {
        let err = parse_body("<w:document><w:body><w:p></w:body>", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_package_round_trip() {
        let mut doc = NativeDocument::new();
        doc.properties.title = Some("Plan & Goals".into());

        let mut heading = NativeParagraph::styled("Heading2");
        heading.props.spacing = Spacing::around(200);
        heading.push_run(Run::new(
            "Goals",
            RunProps {
                color: Some(RgbColor(0xC5, 0x5A, 0x11)),
                ..Default::default()
            },
        ));
        doc.push_paragraph(heading);

        let mut style = StyleDef::new("Heading2", "heading 2", StyleKind::Paragraph);
        style.run.size = Some(28);
        doc.styles.insert(style);

        doc.numbering.abstracts.push(AbstractNum {
            id: 1,
            levels: vec![NumLevel {
                level: 0,
                format: NumFormat::Bullet,
                text: "•".into(),
                start: 1,
                indent: 360,
            }],
        });
        doc.numbering.add_instance(1, Some((0, 3)));

        let read = read_package(&write_package(&doc).unwrap()).unwrap();
        assert_eq!(read.properties.title.as_deref(), Some("Plan & Goals"));
        assert_eq!(read.body, doc.body);
        assert_eq!(read.styles.style_size("Heading2"), Some(28));
        assert_eq!(read.styles.name_of("Heading2"), "heading 2");
        assert_eq!(read.numbering, doc.numbering);
    }
}

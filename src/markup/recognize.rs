//! Line classifiers for Markdown block structure.
//!
//! Every recognizer is a pure function over a [`LineWindow`]. They are
//! evaluated in the order of [`RECOGNIZERS`]; the first match wins, and a
//! line nothing claims is paragraph text. That order is the whole conflict
//! resolution policy: a header box is tried before a horizontal rule, so
//! `["====", "TITLE", "===="]` is one header box and never two rules around
//! a paragraph.

use crate::model::Alignment;
use regex::Regex;
use std::sync::OnceLock;

/// Characters that form a long horizontal rule when repeated.
pub const RULE_CHARS: &[char] = &['-', '=', '─', '━', '═'];

/// Minimum repeat count for a long horizontal rule.
pub const MIN_RULE_LEN: usize = 10;

/// Characters of a header box border line.
pub const BOX_CHARS: &[char] = &['=', '═'];

/// Minimum width of a header box border line.
pub const MIN_BOX_BORDER: usize = 3;

/// Maximum number of text lines inside a header box.
pub const MAX_BOX_LINES: usize = 5;

/// A line under classification plus the context recognizers may look at.
#[derive(Debug, Clone, Copy)]
pub struct LineWindow<'a> {
    lines: &'a [&'a str],
    pos: usize,
    follows_paragraph: bool,
    in_table: bool,
}

impl<'a> LineWindow<'a> {
    /// Window at `pos` over all lines of the input.
    pub fn new(lines: &'a [&'a str], pos: usize) -> Self {
        Self {
            lines,
            pos,
            follows_paragraph: false,
            in_table: false,
        }
    }

    /// Mark that the previous line was paragraph text with no blank line in between.
    pub fn after_paragraph(mut self, yes: bool) -> Self {
        self.follows_paragraph = yes;
        self
    }

    /// Mark that a table is open.
    pub fn inside_table(mut self, yes: bool) -> Self {
        self.in_table = yes;
        self
    }

    /// The line being classified.
    pub fn current(&self) -> &'a str {
        self.lines.get(self.pos).copied().unwrap_or("")
    }

    /// A following line, `offset` lines ahead.
    pub fn peek(&self, offset: usize) -> Option<&'a str> {
        self.lines.get(self.pos + offset).copied()
    }
}

/// Classification verdict with the extracted payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognized {
    /// Opening code fence
    CodeFence {
        /// Fence character (`` ` `` or `~`)
        fence: char,
        /// Fence length
        width: usize,
        /// Leading indentation of the fence
        indent: usize,
        /// Info string
        info: Option<String>,
    },

    /// Bordered header box spanning several lines
    HeaderBox {
        /// Inner lines joined with `\n`, verbatim
        display: String,
        /// Display string with any leading icon removed
        label: String,
        /// Lines consumed, borders included
        consumed: usize,
    },

    /// `---` directly under a paragraph line
    SetextUnderline,

    /// Thematic break
    HorizontalRule,

    /// ATX heading
    Heading {
        /// Level (1-6)
        level: u8,
        /// Heading text
        text: String,
    },

    /// Pipe-delimited table row
    TableRow {
        /// Raw cell text
        cells: Vec<String>,
    },

    /// `>` quoted line
    Blockquote {
        /// Text after the marker
        text: String,
    },

    /// List item line
    ListItem {
        /// Leading spaces
        spaces: usize,
        /// Leading tabs
        tabs: usize,
        /// Numbered item
        ordered: bool,
        /// Number of a numbered item
        number: Option<u32>,
        /// Item text
        text: String,
    },

    /// Plain text line
    Paragraph {
        /// Trimmed text
        text: String,
    },
}

impl Recognized {
    /// Number of input lines this verdict covers.
    pub fn consumed(&self) -> usize {
        match self {
            Recognized::HeaderBox { consumed, .. } => *consumed,
            _ => 1,
        }
    }

    /// Short name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Recognized::CodeFence { .. } => "code_fence",
            Recognized::HeaderBox { .. } => "header_box",
            Recognized::SetextUnderline => "setext_underline",
            Recognized::HorizontalRule => "horizontal_rule",
            Recognized::Heading { .. } => "heading",
            Recognized::TableRow { .. } => "table_row",
            Recognized::Blockquote { .. } => "blockquote",
            Recognized::ListItem { .. } => "list_item",
            Recognized::Paragraph { .. } => "paragraph",
        }
    }
}

/// A recognizer: predicate and constructor in one.
pub type Recognizer = fn(&LineWindow<'_>) -> Option<Recognized>;

/// All recognizers in priority order.
pub const RECOGNIZERS: &[(&str, Recognizer)] = &[
    ("code_fence", code_fence),
    ("header_box", header_box),
    ("setext_underline", setext_underline),
    ("horizontal_rule", horizontal_rule),
    ("heading", atx_heading),
    ("table_row", table_row),
    ("blockquote", blockquote),
    ("list_item", list_item),
];

/// Classify the window's current line.
pub fn classify(window: &LineWindow<'_>) -> Recognized {
    RECOGNIZERS
        .iter()
        .find_map(|(_, recognize)| recognize(window))
        .unwrap_or_else(|| Recognized::Paragraph {
            text: window.current().trim().to_string(),
        })
}

/// Check if a line is a horizontal rule.
///
/// Either exactly `---`, `***` or `___`, or one character from
/// [`RULE_CHARS`] repeated at least [`MIN_RULE_LEN`] times.
pub fn is_horizontal_rule(line: &str) -> bool {
    let trimmed = line.trim();
    if matches!(trimmed, "---" | "***" | "___") {
        return true;
    }
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) if RULE_CHARS.contains(&first) => {
            chars.all(|c| c == first) && trimmed.chars().count() >= MIN_RULE_LEN
        }
        _ => false,
    }
}

/// Check if a line can border a header box.
pub fn is_box_border(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.chars().count() >= MIN_BOX_BORDER && trimmed.chars().all(|c| BOX_CHARS.contains(&c))
}

/// Find a header box starting at `pos`.
///
/// Returns the display string (inner lines, trimmed, joined with `\n`) and
/// the number of lines consumed including both borders.
pub fn header_box_at(lines: &[&str], pos: usize) -> Option<(String, usize)> {
    if !is_box_border(lines.get(pos)?) {
        return None;
    }

    let mut inner = Vec::new();
    for offset in 1..=MAX_BOX_LINES + 1 {
        let line = lines.get(pos + offset)?;
        if is_box_border(line) {
            if inner.is_empty() {
                return None;
            }
            return Some((inner.join("\n"), offset + 1));
        }
        if line.trim().is_empty() || is_horizontal_rule(line) || inner.len() == MAX_BOX_LINES {
            return None;
        }
        inner.push(line.trim());
    }
    None
}

/// Remove a leading icon (emoji or pictograph) and the space after it.
pub fn strip_icon(text: &str) -> &str {
    let trimmed = text.trim_start();
    let rest = trimmed.trim_start_matches(|c: char| is_icon_char(c));
    if rest.len() == trimmed.len() {
        trimmed.trim_end()
    } else {
        rest.trim()
    }
}

fn is_icon_char(c: char) -> bool {
    matches!(c as u32,
        0x2190..=0x21FF     // arrows
        | 0x2300..=0x23FF   // technical
        | 0x2460..=0x24FF   // enclosed alphanumerics
        | 0x25A0..=0x27BF   // shapes, dingbats
        | 0x2B00..=0x2BFF
        | 0x1F000..=0x1FAFF // emoji blocks
        | 0xFE0F | 0x200D)
}

fn code_fence(window: &LineWindow<'_>) -> Option<Recognized> {
    let line = window.current();
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let fence = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let width = rest.chars().take_while(|c| *c == fence).count();
    if width < 3 {
        return None;
    }
    let info = rest[width..].trim();
    if fence == '`' && info.contains('`') {
        return None;
    }
    Some(Recognized::CodeFence {
        fence,
        width,
        indent,
        info: (!info.is_empty()).then(|| info.to_string()),
    })
}

/// Check if a line closes a fence opened with `fence` repeated `width` times.
pub fn closes_fence(line: &str, fence: char, width: usize) -> bool {
    let trimmed = line.trim();
    trimmed.chars().count() >= width && trimmed.chars().all(|c| c == fence)
}

fn header_box(window: &LineWindow<'_>) -> Option<Recognized> {
    let (display, consumed) = header_box_at(window.lines, window.pos)?;
    let label = strip_icon(&display).to_string();
    Some(Recognized::HeaderBox {
        display,
        label,
        consumed,
    })
}

fn setext_underline(window: &LineWindow<'_>) -> Option<Recognized> {
    (window.follows_paragraph && window.current().trim() == "---")
        .then_some(Recognized::SetextUnderline)
}

fn horizontal_rule(window: &LineWindow<'_>) -> Option<Recognized> {
    is_horizontal_rule(window.current()).then_some(Recognized::HorizontalRule)
}

fn atx_heading(window: &LineWindow<'_>) -> Option<Recognized> {
    let line = window.current();
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')) {
        return None;
    }

    let mut text = rest.trim();
    // Optional closing sequence: " ##"
    let without_closing = text.trim_end_matches('#');
    if without_closing.len() < text.len()
        && (without_closing.is_empty() || without_closing.ends_with(' '))
        && !without_closing.ends_with("\\ ")
    {
        text = without_closing.trim_end();
    }

    Some(Recognized::Heading {
        level: level as u8,
        text: text.to_string(),
    })
}

fn table_row(window: &LineWindow<'_>) -> Option<Recognized> {
    let line = window.current();
    if !has_unescaped_pipe(line) {
        return None;
    }
    let starts_with_pipe = line.trim_start().starts_with('|');
    let separator_follows = window.peek(1).map(is_separator_row).unwrap_or(false);
    if starts_with_pipe || window.in_table || separator_follows {
        Some(Recognized::TableRow {
            cells: split_cells(line),
        })
    } else {
        None
    }
}

fn has_unescaped_pipe(line: &str) -> bool {
    let mut escaped = false;
    for c in line.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '|' if !escaped => return true,
            _ => escaped = false,
        }
    }
    false
}

/// Split a pipe row into trimmed cells. Escaped pipes stay in the cell text.
pub fn split_cells(line: &str) -> Vec<String> {
    let mut body = line.trim();
    body = body.strip_prefix('|').unwrap_or(body);
    if body.ends_with('|') && !body.ends_with("\\|") {
        body = &body[..body.len() - 1];
    }

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in body.chars() {
        match c {
            '\\' if !escaped => {
                escaped = true;
                current.push(c);
            }
            '|' if !escaped => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => {
                escaped = false;
                current.push(c);
            }
        }
    }
    cells.push(current.trim().to_string());
    cells
}

/// Check if a line is a table alignment separator such as `|:---|---:|`.
pub fn is_separator_row(line: &str) -> bool {
    line.contains('|') && line.contains('-') && is_separator_cells(&split_cells(line))
}

/// Check if already-split cells form an alignment separator.
pub fn is_separator_cells(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            let inner = cell.trim_start_matches(':').trim_end_matches(':');
            !inner.is_empty() && inner.chars().all(|c| c == '-')
        })
}

/// Column alignment of one separator cell.
pub fn separator_alignment(cell: &str) -> Alignment {
    match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => Alignment::Center,
        (false, true) => Alignment::Right,
        _ => Alignment::Left,
    }
}

fn blockquote(window: &LineWindow<'_>) -> Option<Recognized> {
    let rest = window.current().trim_start().strip_prefix('>')?;
    let text = rest.strip_prefix(' ').unwrap_or(rest);
    Some(Recognized::Blockquote {
        text: text.trim_end().to_string(),
    })
}

fn list_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([ \t]*)(?:[-*+]|(\d{1,9})[.)])(?:[ \t]+(.*))?$")
            .expect("list marker pattern is valid")
    })
}

fn list_item(window: &LineWindow<'_>) -> Option<Recognized> {
    let caps = list_marker().captures(window.current().trim_end())?;
    let indent = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let number = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
    let text = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
    Some(Recognized::ListItem {
        spaces: indent.chars().filter(|c| *c == ' ').count(),
        tabs: indent.chars().filter(|c| *c == '\t').count(),
        ordered: caps.get(2).is_some(),
        number,
        text: text.to_string(),
    })
}

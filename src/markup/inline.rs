//! Inline Markdown: emphasis, code spans, links and escapes.

use crate::model::{Emphasis, InlineSpan};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Spans of one piece of inline text plus the links found in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineText {
    /// Spans in order, adjacent spans with equal formatting merged
    pub spans: Vec<InlineSpan>,

    /// `(span index, target)` for every linked span
    pub links: Vec<(usize, String)>,
}

impl InlineText {
    /// Check if any span carries a link.
    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }
}

// Escaped punctuation is swapped for a private-use character before
// matching so `\*` can never open emphasis.
const SENTINEL_BASE: u32 = 0xE000;

fn inline_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"``\s?(?P<code2>.+?)\s?``",
            r"|`(?P<code>[^`]+)`",
            r"|\*\*\*(?P<bi>.+?)\*\*\*",
            r"|\*\*(?P<b>.+?)\*\*",
            r"|__(?P<b2>.+?)__",
            r"|\*(?P<i>.+?)\*",
            r"|~~(?P<s>.+?)~~",
            r"|<u>(?P<u>.+?)</u>",
            r"|<sup>(?P<sup>.+?)</sup>",
            r"|<sub>(?P<sub>.+?)</sub>",
            r"|\[(?P<lt>[^\]]+)\]\(",
            r"(?:<(?P<aurl>[^<>\n]*)>|(?P<url>(?:[^()\s]|\([^()\s]*\))+))",
            r#"(?:\s+"[^"]*")?\)"#,
        ))
        .expect("inline pattern is valid")
    })
}

/// Parse inline Markdown into spans.
pub fn parse_inline(text: &str) -> InlineText {
    let protected = protect_escapes(text);
    let mut pieces: Vec<(InlineSpan, Option<String>)> = Vec::new();
    parse_into(&protected, Emphasis::default(), None, &mut pieces);

    let mut result = InlineText::default();
    for (mut span, link) in pieces {
        span.text = restore_escapes(&span.text, span.emphasis.code);
        if span.text.is_empty() {
            continue;
        }
        let merge = match (result.spans.last(), result.links.last()) {
            (Some(last), last_link) if last.emphasis == span.emphasis => {
                let last_index = result.spans.len() - 1;
                let last_url = last_link
                    .filter(|(i, _)| *i == last_index)
                    .map(|(_, u)| u.as_str());
                last_url == link.as_deref()
            }
            _ => false,
        };
        if merge {
            if let Some(last) = result.spans.last_mut() {
                last.text.push_str(&span.text);
            }
        } else {
            if let Some(url) = link {
                result.links.push((result.spans.len(), url));
            }
            result.spans.push(span);
        }
    }
    result
}

/// Remove Markdown syntax, keeping only the text.
pub fn strip_inline(text: &str) -> String {
    parse_inline(text)
        .spans
        .into_iter()
        .map(|s| s.text)
        .collect()
}

fn parse_into(
    text: &str,
    emphasis: Emphasis,
    link: Option<&str>,
    out: &mut Vec<(InlineSpan, Option<String>)>,
) {
    let mut last = 0;
    for caps in inline_pattern().captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            push(out, &text[last..whole.start()], emphasis, link);
        }
        apply_match(&caps, emphasis, link, out);
        last = whole.end();
    }
    if last < text.len() {
        push(out, &text[last..], emphasis, link);
    }
}

fn apply_match(
    caps: &Captures<'_>,
    emphasis: Emphasis,
    link: Option<&str>,
    out: &mut Vec<(InlineSpan, Option<String>)>,
) {
    let group = |name: &str| caps.name(name).map(|m| m.as_str());

    if let Some(code) = group("code2").or_else(|| group("code")) {
        let flags = Emphasis {
            code: true,
            ..emphasis
        };
        push(out, code, flags, link);
    } else if let Some(inner) = group("bi") {
        let flags = Emphasis {
            bold: true,
            italic: true,
            ..emphasis
        };
        parse_into(inner, flags, link, out);
    } else if let Some(inner) = group("b").or_else(|| group("b2")) {
        parse_into(inner, Emphasis { bold: true, ..emphasis }, link, out);
    } else if let Some(inner) = group("i") {
        parse_into(inner, Emphasis { italic: true, ..emphasis }, link, out);
    } else if let Some(inner) = group("s") {
        let flags = Emphasis {
            strikethrough: true,
            ..emphasis
        };
        parse_into(inner, flags, link, out);
    } else if let Some(inner) = group("u") {
        let flags = Emphasis {
            underline: true,
            ..emphasis
        };
        parse_into(inner, flags, link, out);
    } else if let Some(inner) = group("sup") {
        let flags = Emphasis {
            superscript: true,
            ..emphasis
        };
        parse_into(inner, flags, link, out);
    } else if let Some(inner) = group("sub") {
        let flags = Emphasis {
            subscript: true,
            ..emphasis
        };
        parse_into(inner, flags, link, out);
    } else if let (Some(label), Some(url)) = (group("lt"), group("aurl").or_else(|| group("url"))) {
        let url = restore_escapes(url, false);
        parse_into(label, emphasis, Some(&url), out);
    }
}

fn push(
    out: &mut Vec<(InlineSpan, Option<String>)>,
    text: &str,
    emphasis: Emphasis,
    link: Option<&str>,
) {
    if !text.is_empty() {
        out.push((InlineSpan::new(text, emphasis), link.map(str::to_string)));
    }
}

fn protect_escapes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_punctuation() {
                    chars.next();
                    if let Some(sentinel) = char::from_u32(SENTINEL_BASE + next as u32) {
                        result.push(sentinel);
                        continue;
                    }
                }
            }
        }
        result.push(c);
    }
    result
}

fn restore_escapes(text: &str, keep_backslash: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if (SENTINEL_BASE..SENTINEL_BASE + 0x80).contains(&code) {
            if let Some(original) = char::from_u32(code - SENTINEL_BASE) {
                if keep_backslash {
                    result.push('\\');
                }
                result.push(original);
                continue;
            }
        }
        result.push(c);
    }
    result
}

/// Remove backslash escapes from text that is not parsed for emphasis.
pub fn unescape(text: &str) -> String {
    restore_escapes(&protect_escapes(text), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(inline: &InlineText) -> Vec<&str> {
        inline.spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_plain_text() {
        let parsed = parse_inline("just text");
        assert_eq!(parsed.spans, vec![InlineSpan::plain("just text")]);
        assert!(!parsed.has_links());
    }

    #[test]
    fn test_emphasis_kinds() {
        let parsed = parse_inline("a **b** *c* ***d*** `e` ~~f~~");
        assert_eq!(texts(&parsed), vec!["a ", "b", " ", "c", " ", "d", " ", "e", " ", "f"]);
        assert!(parsed.spans[1].emphasis.bold);
        assert!(parsed.spans[3].emphasis.italic);
        assert!(parsed.spans[5].emphasis.bold && parsed.spans[5].emphasis.italic);
        assert!(parsed.spans[7].emphasis.code);
        assert!(parsed.spans[9].emphasis.strikethrough);
    }

    #[test]
    fn test_nested_emphasis() {
        let parsed = parse_inline("**bold ~~struck~~**");
        assert_eq!(texts(&parsed), vec!["bold ", "struck"]);
        assert!(parsed.spans[1].emphasis.bold && parsed.spans[1].emphasis.strikethrough);
    }

    #[test]
    fn test_html_tags() {
        let parsed = parse_inline("H<sub>2</sub>O and x<sup>2</sup> <u>under</u>");
        assert!(parsed.spans[1].emphasis.subscript);
        assert!(parsed.spans[3].emphasis.superscript);
        assert!(parsed.spans[5].emphasis.underline);
    }

    #[test]
    fn test_links() {
        let parsed = parse_inline("see [the docs](https://example.com/a) now");
        assert_eq!(texts(&parsed), vec!["see ", "the docs", " now"]);
        assert_eq!(parsed.links, vec![(1, "https://example.com/a".to_string())]);
    }

    #[test]
    fn test_link_targets_with_parentheses_and_spaces() {
        let parsed = parse_inline("[Rust](https://en.wikipedia.org/wiki/Rust_(lang)) and more");
        assert_eq!(texts(&parsed), vec!["Rust", " and more"]);
        assert_eq!(
            parsed.links,
            vec![(0, "https://en.wikipedia.org/wiki/Rust_(lang)".to_string())]
        );

        let parsed = parse_inline("[notes](<file:///My Docs/a (1).txt>)");
        assert_eq!(texts(&parsed), vec!["notes"]);
        assert_eq!(parsed.links, vec![(0, "file:///My Docs/a (1).txt".to_string())]);
    }

    #[test]
    fn test_escapes() {
        let parsed = parse_inline(r"not \*emphasis\* here");
        assert_eq!(texts(&parsed), vec!["not *emphasis* here"]);
        assert!(parsed.spans[0].emphasis.is_plain());
    }

    #[test]
    fn test_code_keeps_backslashes() {
        let parsed = parse_inline(r"`a\*b`");
        assert_eq!(parsed.spans[0].text, r"a\*b");
        assert!(parsed.spans[0].emphasis.code);
    }

    #[test]
    fn test_code_with_backtick() {
        let parsed = parse_inline("`` a`b ``");
        assert_eq!(parsed.spans[0].text, "a`b");
    }

    #[test]
    fn test_strip_and_unescape() {
        assert_eq!(strip_inline("**Hello** [you](http://x)"), "Hello you");
        assert_eq!(unescape(r"1\. not a list"), "1. not a list");
    }
}

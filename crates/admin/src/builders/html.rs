//! Minimal HTML helpers for builder and SEO text.
//!
//! Regex based. Good enough for editor output, not a general HTML parser.

use std::sync::LazyLock;

use regex::Regex;

use super::{ImageRef, TextKind};

/// `<script>`/`<style>` blocks including their content.
static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("Invalid regex")
});

/// Tags that end a line of text when removed.
static BLOCK_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|blockquote|tr|td|th)>").expect("Invalid regex")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("Invalid regex"));

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]>").expect("Invalid regex"));

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("Invalid regex"));

static IMG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("Invalid regex"));

static IMG_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(src|alt)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex")
});

/// Remove tags, decode entities and collapse whitespace.
#[must_use]
pub fn strip_tags(html: &str) -> String {
    let without_scripts = SCRIPT_STYLE_RE.replace_all(html, " ");
    let with_breaks = BLOCK_BREAK_RE.replace_all(&without_scripts, " ");
    let text = TAG_RE.replace_all(&with_breaks, "");
    let decoded = decode_entities(&text);
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Decode the named entities editors emit plus numeric references.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let numeric = NUMERIC_ENTITY_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        let raw = &caps[1];
        let code = raw
            .strip_prefix('x')
            .map_or_else(|| raw.parse::<u32>().ok(), |hex| u32::from_str_radix(hex, 16).ok());
        code.and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), |c| c.to_string())
    });

    numeric
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&ndash;", "\u{2013}")
        .replace("&mdash;", "\u{2014}")
        .replace("&hellip;", "\u{2026}")
        .replace("&rsquo;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&rdquo;", "\u{201d}")
        .replace("&ldquo;", "\u{201c}")
        // last, so "&amp;lt;" stays "&lt;"
        .replace("&amp;", "&")
}

/// Number of whitespace separated words in plain text.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split HTML into heading and paragraph blocks, in document order.
#[must_use]
pub fn text_blocks(html: &str) -> Vec<(TextKind, String)> {
    let mut blocks = Vec::new();
    let mut last = 0;

    let push_body = |segment: &str, blocks: &mut Vec<(TextKind, String)>| {
        let text = strip_tags(segment);
        if !text.is_empty() {
            blocks.push((TextKind::Paragraph, text));
        }
    };

    for caps in HEADING_RE.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_body(&html[last..whole.start()], &mut blocks);

        let heading = strip_tags(&caps[2]);
        if !heading.is_empty() {
            blocks.push((TextKind::Heading, heading));
        }
        last = whole.end();
    }
    push_body(&html[last..], &mut blocks);

    blocks
}

/// Whether the HTML contains an `h2`..`h6` heading.
#[must_use]
pub fn has_subheadings(html: &str) -> bool {
    HEADING_RE
        .captures_iter(html)
        .any(|caps| &caps[1] != "1")
}

/// Plain text of the first paragraph.
///
/// Falls back to the first 50 words when there are no `<p>` tags.
#[must_use]
pub fn first_paragraph(html: &str) -> String {
    PARAGRAPH_RE
        .captures_iter(html)
        .map(|caps| strip_tags(&caps[1]))
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| {
            strip_tags(html)
                .split_whitespace()
                .take(50)
                .collect::<Vec<_>>()
                .join(" ")
        })
}

/// All `<img>` tags with a `src`.
#[must_use]
pub fn images(html: &str) -> Vec<ImageRef> {
    IMG_RE
        .find_iter(html)
        .filter_map(|tag| {
            let mut src = None;
            let mut alt = None;
            for caps in IMG_ATTR_RE.captures_iter(tag.as_str()) {
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map(|m| decode_entities(m.as_str()));
                if caps[1].eq_ignore_ascii_case("src") {
                    src = value;
                } else {
                    alt = value;
                }
            }
            src.filter(|s| !s.is_empty())
                .map(|url| ImageRef::new(url, alt.as_deref()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags_keeps_word_boundaries() {
        let html = "<p>Hello<br/>world</p><p>Second&nbsp;para</p>";
        assert_eq!(strip_tags(html), "Hello world Second para");
    }

    #[test]
    fn test_strip_tags_drops_scripts() {
        let html = "<p>Visible</p><script>var hidden = 1;</script><style>p{}</style>";
        assert_eq!(strip_tags(html), "Visible");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&#8220;hi&#8221;"), "\u{201c}hi\u{201d}");
        assert_eq!(decode_entities("&#x27;x&#x27;"), "'x'");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(decode_entities("no entities"), "no entities");
    }

    #[test]
    fn test_text_blocks_preserves_order() {
        let html = "<p>Intro</p><h2>Features</h2><p>Fast</p><h3>Price</h3>";
        let blocks = text_blocks(html);
        assert_eq!(
            blocks,
            vec![
                (TextKind::Paragraph, "Intro".to_string()),
                (TextKind::Heading, "Features".to_string()),
                (TextKind::Paragraph, "Fast".to_string()),
                (TextKind::Heading, "Price".to_string()),
            ]
        );
    }

    #[test]
    fn test_has_subheadings() {
        assert!(has_subheadings("<h1>T</h1><h2>Sub</h2>"));
        assert!(!has_subheadings("<h1>Only title</h1><p>x</p>"));
    }

    #[test]
    fn test_first_paragraph() {
        assert_eq!(
            first_paragraph("<p></p><p>The <b>first</b> one</p><p>second</p>"),
            "The first one"
        );
        assert_eq!(first_paragraph("plain text only"), "plain text only");
    }

    #[test]
    fn test_images() {
        let html = r#"<img src="https://cdn.example.com/a.jpg" alt="A &amp; B"><img alt='no src'><img src='/b.png'>"#;
        let found = images(html);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].url, "https://cdn.example.com/a.jpg");
        assert_eq!(found[0].alt.as_deref(), Some("A & B"));
        assert_eq!(found[1].alt, None);
    }
}

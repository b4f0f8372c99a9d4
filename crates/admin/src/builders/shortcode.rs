//! WordPress shortcode tokenizer.
//!
//! Handles `[tag attr="v" attr2='v' attr3=v bare]inner[/tag]`, self-closing
//! `[tag /]`, nesting, and escaped `[[tag]]`. As in WordPress, an opening tag
//! without a matching close is treated as self-closing and whatever followed
//! it belongs to the parent.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::{ImageRef, TextBlock, html};

/// Opening tag at the start of the input: name, raw attributes, optional `/`.
static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([A-Za-z][\w-]*)((?:\s+(?:[^\]\x22']|\x22[^\x22]*\x22|'[^']*')*?)?)\s*(/)?\]")
        .expect("Invalid regex")
});

static CLOSE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[/([A-Za-z][\w-]*)\s*\]").expect("Invalid regex"));

/// One attribute: `k="v"`, `k='v'`, `k=v`, `"v"` or `v`.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([\w-]+)\s*=\s*"([^"]*)"|([\w-]+)\s*=\s*'([^']*)'|([\w-]+)\s*=\s*([^\s'"]+)|"([^"]*)"|'([^']*)'|(\S+)"#,
    )
    .expect("Invalid regex")
});

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".avif"];
const IMAGE_ATTRS: &[&str] = &["src", "image", "url"];

/// A parsed content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Text(String),
    Shortcode {
        tag: String,
        attrs: BTreeMap<String, String>,
        children: Vec<Self>,
    },
}

struct Frame {
    tag: String,
    attrs: BTreeMap<String, String>,
    children: Vec<Node>,
}

impl Frame {
    /// Close this frame as a self-closing tag; its collected children become
    /// siblings.
    fn unclosed(self) -> Vec<Node> {
        let mut nodes = vec![Node::Shortcode {
            tag: self.tag,
            attrs: self.attrs,
            children: Vec::new(),
        }];
        nodes.extend(self.children);
        nodes
    }
}

/// Parse content into a tree of text and shortcode nodes.
#[must_use]
pub fn parse(content: &str) -> Vec<Node> {
    let mut root: Vec<Node> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut text = String::new();
    let mut rest = content;

    while let Some(offset) = rest.find('[') {
        text.push_str(&rest[..offset]);
        rest = &rest[offset..];

        // [[tag]] prints "[tag]" literally
        if rest.starts_with("[[") {
            if let Some(end) = rest.find("]]") {
                text.push_str(&rest[1..=end]);
                rest = &rest[end + 2..];
                continue;
            }
        }

        if let Some(caps) = CLOSE_TAG_RE.captures(rest) {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let tag = &caps[1];
            if let Some(index) = stack.iter().rposition(|f| f.tag == tag) {
                flush_text(&mut text, &mut stack, &mut root);
                while stack.len() > index + 1 {
                    if let Some(frame) = stack.pop() {
                        let nodes = frame.unclosed();
                        current(&mut stack, &mut root).extend(nodes);
                    }
                }
                if let Some(frame) = stack.pop() {
                    current(&mut stack, &mut root).push(Node::Shortcode {
                        tag: frame.tag,
                        attrs: frame.attrs,
                        children: frame.children,
                    });
                }
            } else {
                text.push_str(&rest[..whole]);
            }
            rest = &rest[whole..];
            continue;
        }

        if let Some(caps) = OPEN_TAG_RE.captures(rest) {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let tag = caps[1].to_string();
            let attrs = parse_attrs(caps.get(2).map_or("", |m| m.as_str()));
            let self_closing = caps.get(3).is_some();

            flush_text(&mut text, &mut stack, &mut root);
            if self_closing {
                current(&mut stack, &mut root).push(Node::Shortcode {
                    tag,
                    attrs,
                    children: Vec::new(),
                });
            } else {
                stack.push(Frame {
                    tag,
                    attrs,
                    children: Vec::new(),
                });
            }
            rest = &rest[whole..];
            continue;
        }

        text.push('[');
        rest = &rest[1..];
    }

    text.push_str(rest);
    flush_text(&mut text, &mut stack, &mut root);

    while let Some(frame) = stack.pop() {
        let nodes = frame.unclosed();
        current(&mut stack, &mut root).extend(nodes);
    }

    root
}

fn current<'a>(stack: &'a mut [Frame], root: &'a mut Vec<Node>) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(frame) => &mut frame.children,
        None => root,
    }
}

fn flush_text(text: &mut String, stack: &mut [Frame], root: &mut Vec<Node>) {
    if !text.is_empty() {
        current(stack, root).push(Node::Text(std::mem::take(text)));
    }
}

/// Parse a raw attribute string. Positional attributes map to an empty value.
#[must_use]
pub fn parse_attrs(raw: &str) -> BTreeMap<String, String> {
    let mut attrs = BTreeMap::new();

    for caps in ATTR_RE.captures_iter(raw) {
        let pair = [(1, 2), (3, 4), (5, 6)]
            .into_iter()
            .find_map(|(k, v)| Some((caps.get(k)?.as_str(), caps.get(v)?.as_str())));

        if let Some((key, value)) = pair {
            attrs.insert(key.to_ascii_lowercase(), html::decode_entities(value));
        } else if let Some(bare) = caps.get(7).or_else(|| caps.get(8)).or_else(|| caps.get(9)) {
            let bare = bare.as_str().trim_end_matches('/');
            if !bare.is_empty() {
                attrs.insert(bare.to_string(), String::new());
            }
        }
    }

    attrs
}

/// Extract text blocks and images from classic/shortcode content.
#[must_use]
pub fn extract(content: &str) -> (Vec<TextBlock>, Vec<ImageRef>) {
    let mut texts = Vec::new();
    let mut images = Vec::new();
    collect(&parse(content), &mut texts, &mut images);
    (texts, images)
}

fn collect(nodes: &[Node], texts: &mut Vec<TextBlock>, images: &mut Vec<ImageRef>) {
    for node in nodes {
        match node {
            Node::Text(raw) => {
                texts.extend(
                    html::text_blocks(raw)
                        .into_iter()
                        .map(|(kind, text)| TextBlock::new(kind, text)),
                );
                images.extend(html::images(raw));
            }
            Node::Shortcode {
                attrs, children, ..
            } => {
                for key in IMAGE_ATTRS {
                    if let Some(url) = attrs.get(*key).filter(|v| is_image_url(v)) {
                        images.push(ImageRef::new(url.clone(), attrs.get("alt").map(String::as_str)));
                    }
                }
                collect(children, texts, images);
            }
        }
    }
}

fn is_image_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::TextKind;

    fn shortcode(tag: &str, attrs: &[(&str, &str)], children: Vec<Node>) -> Node {
        Node::Shortcode {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            children,
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("just text"), vec![Node::Text("just text".to_string())]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_enclosing_with_attribute_styles() {
        let nodes = parse(r#"[box title="Hello World" size='large' color=red hidden]inside[/box]"#);
        assert_eq!(
            nodes,
            vec![shortcode(
                "box",
                &[
                    ("title", "Hello World"),
                    ("size", "large"),
                    ("color", "red"),
                    ("hidden", "")
                ],
                vec![Node::Text("inside".to_string())]
            )]
        );
    }

    #[test]
    fn test_self_closing_and_nesting() {
        let nodes = parse("a [row][col]one[/col][col]two[/col][/row] [divider /] b");
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[0], Node::Text("a ".to_string()));
        match &nodes[1] {
            Node::Shortcode { tag, children, .. } => {
                assert_eq!(tag, "row");
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected shortcode, got {other:?}"),
        }
        assert_eq!(nodes[3], shortcode("divider", &[], vec![]));
    }

    #[test]
    fn test_unclosed_tag_is_self_closing() {
        let nodes = parse("[gallery ids=\"1,2\"] caption text [section]body[/section]");
        assert_eq!(
            nodes,
            vec![
                shortcode("gallery", &[("ids", "1,2")], vec![]),
                Node::Text(" caption text ".to_string()),
                shortcode("section", &[], vec![Node::Text("body".to_string())]),
            ]
        );
    }

    #[test]
    fn test_escaped_shortcode_kept_literally() {
        let nodes = parse("Use [[gallery]] to show images");
        assert_eq!(
            nodes,
            vec![Node::Text("Use [gallery] to show images".to_string())]
        );
    }

    #[test]
    fn test_stray_brackets_and_closers() {
        let nodes = parse("save [10% off] and [/orphan] here");
        assert_eq!(
            nodes,
            vec![Node::Text("save [10% off] and [/orphan] here".to_string())]
        );
    }

    #[test]
    fn test_extract_text_and_images() {
        let content = r#"<h2>Lookbook</h2>[fl_builder_insert_layout id="12"]
            [caption]<img src="https://cdn.example.com/a.jpg" alt="Look A">Spring look[/caption]
            [hero image="https://cdn.example.com/hero.webp?w=1200" alt="Hero"]Big sale[/hero]
            [video src="https://cdn.example.com/clip.mp4" /]"#;

        let (texts, images) = extract(content);
        let values: Vec<_> = texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(values, vec!["Lookbook", "Spring look", "Big sale"]);
        assert_eq!(texts[0].kind, TextKind::Heading);

        let urls: Vec<_> = images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/hero.webp?w=1200"
            ]
        );
        assert_eq!(images[1].alt.as_deref(), Some("Hero"));
    }

    #[test]
    fn test_is_image_url() {
        assert!(is_image_url("https://x/a.JPG"));
        assert!(is_image_url("/b.png?ver=2"));
        assert!(!is_image_url("https://x/page"));
    }
}

//! Beaver Builder `_fl_builder_data` extraction.
//!
//! The data is a flat object of nodes keyed by node id. Each node names its
//! `parent` and its `position` among siblings, so document order has to be
//! rebuilt from the tree. The map key is the node's identity; the `node`
//! field inside it is ignored.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::{BuilderError, ImageRef, TextBlock, TextKind, html};

struct Node<'a> {
    id: &'a str,
    node_type: &'a str,
    position: f64,
    settings: &'a Value,
}

/// Extract text and images from Beaver Builder layout data in tree order.
///
/// # Errors
///
/// Returns `BuilderError::InvalidJson` if a string payload is not valid JSON,
/// or `BuilderError::UnexpectedShape` if it is not an object of nodes.
pub fn extract(data: &Value) -> Result<(Vec<TextBlock>, Vec<ImageRef>), BuilderError> {
    let parsed;
    let root = match data {
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw)
                .map_err(|e| BuilderError::InvalidJson(format!("_fl_builder_data: {e}")))?;
            &parsed
        }
        other => other,
    };

    let Value::Object(nodes) = root else {
        return Err(BuilderError::UnexpectedShape(
            "_fl_builder_data is not an object".to_string(),
        ));
    };

    let mut children: HashMap<Option<&str>, Vec<Node<'_>>> = HashMap::new();
    for (key, node) in nodes {
        let parent = node
            .get("parent")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty() && nodes.contains_key(*p));
        children.entry(parent).or_default().push(Node {
            id: key.as_str(),
            node_type: node.get("type").and_then(Value::as_str).unwrap_or_default(),
            position: position(node.get("position")),
            settings: node.get("settings").unwrap_or(&Value::Null),
        });
    }

    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| a.position.total_cmp(&b.position).then(a.id.cmp(b.id)));
    }

    let mut texts = Vec::new();
    let mut images = Vec::new();
    walk(&children, &mut texts, &mut images);

    Ok((texts, images))
}

/// Positions are numbers, but older layouts store them as strings.
fn position(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

/// Pre-order walk from the root nodes. Iterative, and each node is emitted
/// at most once, so malformed parent links cannot loop or exhaust the stack.
fn walk<'a>(
    children: &HashMap<Option<&'a str>, Vec<Node<'a>>>,
    texts: &mut Vec<TextBlock>,
    images: &mut Vec<ImageRef>,
) {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&Node<'a>> = children
        .get(&None)
        .map(|roots| roots.iter().rev().collect())
        .unwrap_or_default();

    while let Some(node) = stack.pop() {
        if !visited.insert(node.id) {
            continue;
        }

        match node.node_type {
            "module" => module_content(node.settings, texts, images),
            "row" | "column" => {
                if let Some(url) = str_setting(node.settings, "bg_image_src") {
                    images.push(ImageRef::new(url, None));
                }
            }
            _ => {}
        }

        if let Some(kids) = children.get(&Some(node.id)) {
            stack.extend(kids.iter().rev());
        }
    }
}

fn module_content(settings: &Value, texts: &mut Vec<TextBlock>, images: &mut Vec<ImageRef>) {
    let mut text = |kind: TextKind, key: &str| {
        if let Some(raw) = str_setting(settings, key) {
            let value = html::strip_tags(raw);
            if !value.is_empty() {
                texts.push(TextBlock::new(kind, value));
            }
        }
    };

    match str_setting(settings, "type").unwrap_or_default() {
        "heading" => text(TextKind::Heading, "heading"),
        "rich-text" => text(TextKind::Paragraph, "text"),
        "button" => text(TextKind::Button, "text"),
        "callout" => {
            text(TextKind::Heading, "title");
            text(TextKind::Paragraph, "text");
        }
        "photo" => {
            if let Some(url) = str_setting(settings, "photo_src") {
                images.push(ImageRef::new(url, str_setting(settings, "alt")));
            }
        }
        _ => {}
    }
}

fn str_setting<'a>(settings: &'a Value, key: &str) -> Option<&'a str> {
    settings
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

//! Text and image extraction from WordPress page-builder content.
//!
//! Posts can be built three ways:
//!
//! - **Elementor**: layout JSON in the `_elementor_data` custom field
//! - **Beaver Builder**: node map in the `_fl_builder_data` custom field
//! - **Classic**: HTML in `post_content`, possibly with shortcodes
//!
//! [`detect`] picks the source from the post meta, [`extract`] returns the
//! text blocks and images in document order.

pub mod beaver;
pub mod elementor;
pub mod html;
pub mod shortcode;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from parsing builder data.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// The stored layout is not valid JSON.
    #[error("invalid builder JSON: {0}")]
    InvalidJson(String),

    /// Valid JSON, but not the structure the builder writes.
    #[error("unexpected builder data: {0}")]
    UnexpectedShape(String),
}

/// Which builder produced the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Builder {
    Elementor,
    Beaver,
    Classic,
}

/// Role of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Heading,
    Paragraph,
    Button,
    Quote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextBlock {
    pub kind: TextKind,
    pub text: String,
}

impl TextBlock {
    #[must_use]
    pub fn new(kind: TextKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

impl ImageRef {
    /// An image; blank alt text is stored as `None`.
    #[must_use]
    pub fn new(url: impl Into<String>, alt: Option<&str>) -> Self {
        Self {
            url: url.into(),
            alt: alt
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }
    }
}

/// Everything extracted from one post or page.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedContent {
    pub builder: Builder,
    pub texts: Vec<TextBlock>,
    /// Unique by URL, first occurrence wins.
    pub images: Vec<ImageRef>,
    pub word_count: usize,
}

impl ExtractedContent {
    fn new(builder: Builder, texts: Vec<TextBlock>, images: Vec<ImageRef>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let images = images
            .into_iter()
            .filter(|image| seen.insert(image.url.clone()))
            .collect();
        let word_count = texts.iter().map(|t| html::word_count(&t.text)).sum();

        Self {
            builder,
            texts,
            images,
            word_count,
        }
    }
}

/// Pick the builder that owns the content of a post.
#[must_use]
pub fn detect(meta: &Map<String, Value>) -> Builder {
    let present = |key: &str| match meta.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty() && s != "[]",
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(nodes)) => !nodes.is_empty(),
        Some(_) => true,
    };

    let elementor_mode = meta.get("_elementor_edit_mode").and_then(Value::as_str);
    if elementor_mode == Some("builder") && present("_elementor_data") {
        return Builder::Elementor;
    }

    if truthy(meta.get("_fl_builder_enabled")) && present("_fl_builder_data") {
        return Builder::Beaver;
    }

    Builder::Classic
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true" | "yes"),
        _ => false,
    }
}

/// Extract text blocks and images from a post's meta and raw content.
///
/// # Errors
///
/// Returns `BuilderError` if the detected builder's layout data is malformed.
pub fn extract(meta: &Map<String, Value>, content: &str) -> Result<ExtractedContent, BuilderError> {
    let builder = detect(meta);

    let (texts, images) = match builder {
        Builder::Elementor => {
            elementor::extract(meta.get("_elementor_data").unwrap_or(&Value::Null))?
        }
        Builder::Beaver => beaver::extract(meta.get("_fl_builder_data").unwrap_or(&Value::Null))?,
        Builder::Classic => shortcode::extract(content),
    };

    Ok(ExtractedContent::new(builder, texts, images))
}

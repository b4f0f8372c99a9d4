//! WordPress REST v2 resource types.

use serde::{Deserialize, Serialize};

use merchdesk_core::WpPostId;

/// Which collection a resource lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Posts,
    Pages,
}

impl ContentKind {
    /// Path segment under `/wp/v2`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Pages => "pages",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "posts" => Ok(Self::Posts),
            "pages" => Ok(Self::Pages),
            _ => Err(format!("invalid content kind: {s} (expected posts or pages)")),
        }
    }
}

/// A field WordPress returns both rendered and (with `context=edit`) raw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl Rendered {
    /// Raw source when available, rendered HTML otherwise.
    #[must_use]
    pub fn source(&self) -> &str {
        self.raw.as_deref().unwrap_or(&self.rendered)
    }
}

/// A post or page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpPost {
    pub id: WpPostId,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub post_type: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(default)]
    pub author: i64,
    #[serde(default)]
    pub featured_media: i64,
    /// Pages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
    /// Registered custom fields. WordPress returns `[]` when there are none.
    #[serde(default, deserialize_with = "meta_map")]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

fn meta_map<'de, D>(deserializer: D) -> Result<serde_json::Map<String, serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

/// Media library item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpMedia {
    pub id: i64,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub alt_text: String,
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub mime_type: String,
}

/// Body for creating or updating a post/page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Query parameters for listing posts/pages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WpListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl WpListParams {
    pub const MAX_PER_PAGE: u32 = 100;
    pub const DEFAULT_PER_PAGE: u32 = 20;

    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("context", "edit".to_string()),
            ("page", self.page().to_string()),
            ("per_page", self.per_page().to_string()),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            query.push(("search", search.trim().to_string()));
        }
        // `any` is not valid for posts; the default (publish) is used instead
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty() && *s != "any") {
            query.push(("status", status.to_string()));
        }
        query
    }
}

/// One page of a paginated WordPress/WooCommerce collection.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    /// From `X-WP-Total`.
    pub total: u64,
    /// From `X-WP-TotalPages`.
    pub total_pages: u32,
}

/// WordPress error body: `{"code": "...", "message": "...", "data": {"status": 404}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct WpErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_post_with_empty_meta_array() {
        let json = r#"{"id": 5, "title": {"rendered": "Hello"}, "meta": []}"#;
        let post: WpPost = serde_json::from_str(json).unwrap();
        assert_eq!(post.id.as_i64(), 5);
        assert!(post.meta.is_empty());
        assert_eq!(post.title.source(), "Hello");
    }

    #[test]
    fn test_rendered_prefers_raw() {
        let json = r#"{"rendered": "<p>Hi</p>\n", "raw": "Hi"}"#;
        let field: Rendered = serde_json::from_str(json).unwrap();
        assert_eq!(field.source(), "Hi");
    }

    #[test]
    fn test_content_kind_parse() {
        assert_eq!("pages".parse::<ContentKind>().unwrap(), ContentKind::Pages);
        assert!("media".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_list_query_requests_edit_context() {
        let query = WpListParams::default().to_query();
        assert_eq!(query[0], ("context", "edit".to_string()));
    }

    #[test]
    fn test_list_query_drops_any_status() {
        let params = WpListParams {
            status: Some("any".to_string()),
            ..WpListParams::default()
        };
        assert!(!params.to_query().iter().any(|(k, _)| *k == "status"));
    }
}

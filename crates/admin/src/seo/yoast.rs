//! Yoast SEO custom fields.
//!
//! Yoast keeps its per-post settings in post meta. WordPress exposes them in
//! the `meta` object of a post (once registered for REST), WooCommerce in the
//! product's `meta_data` list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::woocommerce::MetaData;

pub const TITLE_KEY: &str = "_yoast_wpseo_title";
pub const DESCRIPTION_KEY: &str = "_yoast_wpseo_metadesc";
pub const FOCUS_KEYWORD_KEY: &str = "_yoast_wpseo_focuskw";
pub const CANONICAL_KEY: &str = "_yoast_wpseo_canonical";
pub const NOINDEX_KEY: &str = "_yoast_wpseo_meta-robots-noindex";
pub const OG_TITLE_KEY: &str = "_yoast_wpseo_opengraph-title";
pub const OG_DESCRIPTION_KEY: &str = "_yoast_wpseo_opengraph-description";

/// Yoast fields of one post or product. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoastFields {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub focus_keyword: Option<String>,
    #[serde(default)]
    pub canonical: Option<String>,
    #[serde(default)]
    pub noindex: Option<bool>,
    #[serde(default)]
    pub og_title: Option<String>,
    #[serde(default)]
    pub og_description: Option<String>,
}

impl YoastFields {
    /// Read from a WordPress `meta` object.
    #[must_use]
    pub fn from_wp_meta(meta: &Map<String, Value>) -> Self {
        Self::from_lookup(|key| meta.get(key))
    }

    /// Read from WooCommerce `meta_data`. Later entries win, as in WooCommerce.
    #[must_use]
    pub fn from_woo_meta_data(meta_data: &[MetaData]) -> Self {
        Self::from_lookup(|key| {
            meta_data
                .iter()
                .rev()
                .find(|m| m.key == key)
                .map(|m| &m.value)
        })
    }

    fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a Value>) -> Self {
        let text = |key: &str| {
            lookup(key)
                .and_then(meta_string)
                .filter(|s| !s.trim().is_empty())
        };

        let noindex = text(NOINDEX_KEY).and_then(|v| match v.trim() {
            "1" => Some(true),
            "0" | "2" => Some(false),
            _ => None,
        });

        Self {
            title: text(TITLE_KEY),
            description: text(DESCRIPTION_KEY),
            focus_keyword: text(FOCUS_KEYWORD_KEY),
            canonical: text(CANONICAL_KEY),
            noindex,
            og_title: text(OG_TITLE_KEY),
            og_description: text(OG_DESCRIPTION_KEY),
        }
    }

    /// Set fields as `(meta key, value)` pairs.
    fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        let mut push = |key: &'static str, value: Option<&String>| {
            if let Some(value) = value {
                entries.push((key, value.clone()));
            }
        };

        push(TITLE_KEY, self.title.as_ref());
        push(DESCRIPTION_KEY, self.description.as_ref());
        push(FOCUS_KEYWORD_KEY, self.focus_keyword.as_ref());
        push(CANONICAL_KEY, self.canonical.as_ref());
        push(OG_TITLE_KEY, self.og_title.as_ref());
        push(OG_DESCRIPTION_KEY, self.og_description.as_ref());

        if let Some(noindex) = self.noindex {
            entries.push((NOINDEX_KEY, if noindex { "1" } else { "0" }.to_string()));
        }

        entries
    }

    /// WordPress `meta` object containing only the set fields.
    #[must_use]
    pub fn to_wp_meta(&self) -> Map<String, Value> {
        self.entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value)))
            .collect()
    }

    /// WooCommerce `meta_data` entries for the set fields.
    #[must_use]
    pub fn to_woo_meta_data(&self) -> Vec<MetaData> {
        self.entries()
            .into_iter()
            .map(|(key, value)| MetaData::new(key, value))
            .collect()
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Meta values are usually strings; registered single fields can also come
/// back as numbers or one-element arrays.
fn meta_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.first().and_then(meta_string),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_wp_meta() {
        let meta = json!({
            "_yoast_wpseo_title": "Linen Shirts | Shop",
            "_yoast_wpseo_metadesc": "",
            "_yoast_wpseo_focuskw": ["linen shirt"],
            "_yoast_wpseo_meta-robots-noindex": "1",
            "footnotes": ""
        });
        let fields = YoastFields::from_wp_meta(meta.as_object().unwrap());
        assert_eq!(fields.title.as_deref(), Some("Linen Shirts | Shop"));
        assert_eq!(fields.description, None);
        assert_eq!(fields.focus_keyword.as_deref(), Some("linen shirt"));
        assert_eq!(fields.noindex, Some(true));
    }

    #[test]
    fn test_from_woo_meta_data_last_wins() {
        let meta = vec![
            MetaData::new(TITLE_KEY, "Old"),
            MetaData::new("_sku_extra", "x"),
            MetaData::new(TITLE_KEY, "New"),
        ];
        let fields = YoastFields::from_woo_meta_data(&meta);
        assert_eq!(fields.title.as_deref(), Some("New"));
    }

    #[test]
    fn test_to_wp_meta_only_set_fields() {
        let fields = YoastFields {
            description: Some("Breathable linen.".to_string()),
            noindex: Some(false),
            ..YoastFields::default()
        };
        let meta = fields.to_wp_meta();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[DESCRIPTION_KEY], json!("Breathable linen."));
        assert_eq!(meta[NOINDEX_KEY], json!("0"));
    }

    #[test]
    fn test_to_woo_meta_data() {
        let fields = YoastFields {
            title: Some("T".to_string()),
            focus_keyword: Some("k".to_string()),
            ..YoastFields::default()
        };
        let meta = fields.to_woo_meta_data();
        assert_eq!(
            meta,
            vec![MetaData::new(TITLE_KEY, "T"), MetaData::new(FOCUS_KEYWORD_KEY, "k")]
        );
        assert!(YoastFields::default().is_empty());
    }
}

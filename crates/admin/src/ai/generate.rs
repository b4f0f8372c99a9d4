//! Content generators built on [`AiClient::complete`].

use std::collections::BTreeMap;

use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::builders::html;
use crate::provisioning::template::{MAX_GENERATED_PRODUCTS, StoreTemplate};
use crate::seo::{META_DESCRIPTION_MAX, META_TITLE_MAX, slugify, truncate_at_word};

use super::client::AiClient;
use super::error::AiError;
use super::prompts;
use super::types::{Description, DescriptionInput, SeoInput, SeoSuggestion, TranslateInput};

/// Maximum number of target languages per translate call.
pub const MAX_TRANSLATION_TARGETS: usize = 10;
const SEO_EXCERPT_WORDS: usize = 600;
const DEFAULT_DESCRIPTION_WORDS: u32 = 150;

#[derive(Debug, Deserialize)]
struct RawSeo {
    #[serde(default)]
    meta_title: String,
    #[serde(default)]
    meta_description: String,
    #[serde(default)]
    focus_keyword: Option<String>,
    #[serde(default)]
    slug: Option<String>,
}

impl AiClient {
    /// Suggest SEO title, description, keyword and slug for a page.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidInput` when there is nothing to work from,
    /// otherwise any provider or parse error.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn generate_seo(&self, input: &SeoInput) -> Result<SeoSuggestion, AiError> {
        let text = html::strip_tags(&input.content);
        if input.title.trim().is_empty() && text.is_empty() {
            return Err(AiError::InvalidInput(
                "title or content is required".to_string(),
            ));
        }

        let excerpt = text
            .split_whitespace()
            .take(SEO_EXCERPT_WORDS)
            .collect::<Vec<_>>()
            .join(" ");

        let output = self
            .complete(prompts::SEO_SYSTEM, &prompts::seo_prompt(input, &excerpt), 1024)
            .await?;
        let raw: RawSeo = serde_json::from_value(extract_json(&output)?)
            .map_err(|e| AiError::Parse(format!("unexpected SEO JSON: {e}")))?;

        finalize_seo(raw, input)
    }

    /// Write an HTML product description.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidInput` without a product name, otherwise any
    /// provider error.
    #[instrument(skip(self, input), fields(product = %input.product_name))]
    pub async fn generate_description(
        &self,
        input: &DescriptionInput,
    ) -> Result<Description, AiError> {
        if input.product_name.trim().is_empty() {
            return Err(AiError::InvalidInput("product_name is required".to_string()));
        }

        let max_words = input
            .max_words
            .unwrap_or(DEFAULT_DESCRIPTION_WORDS)
            .clamp(30, 600);
        // ~2 tokens per word plus markup
        let max_tokens = max_words.saturating_mul(3).max(256);

        let output = self
            .complete(
                prompts::DESCRIPTION_SYSTEM,
                &prompts::description_prompt(input, max_words),
                max_tokens,
            )
            .await?;

        Ok(Description {
            html: strip_code_fence(&output).to_string(),
        })
    }

    /// Translate into every target language, one request per target, run
    /// concurrently. Fails as a whole if any target fails.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidInput` for empty text or a target count
    /// outside `1..=10`, otherwise the first provider error.
    #[instrument(skip(self, input), fields(targets = input.targets.len()))]
    pub async fn translate(
        &self,
        input: &TranslateInput,
    ) -> Result<BTreeMap<String, String>, AiError> {
        let targets = validate_targets(input)?;
        #[allow(clippy::cast_possible_truncation)]
        let max_tokens = (input.text.len() as u32).saturating_mul(2).clamp(512, 8192);

        let requests = targets.iter().map(|target| async move {
            let prompt =
                prompts::translate_prompt(&input.text, input.source.as_deref(), target, input.html);
            let output = self
                .complete(prompts::TRANSLATE_SYSTEM, &prompt, max_tokens)
                .await?;
            Ok::<_, AiError>((target.clone(), strip_code_fence(&output).to_string()))
        });

        Ok(try_join_all(requests).await?.into_iter().collect())
    }

    /// Generate a demo catalog for a niche.
    ///
    /// # Errors
    ///
    /// Returns `AiError::InvalidInput` for an empty niche or a count outside
    /// `1..=25`, `AiError::Parse` when the generated template is unusable.
    #[instrument(skip(self))]
    pub async fn generate_store_template(
        &self,
        niche: &str,
        product_count: u32,
    ) -> Result<StoreTemplate, AiError> {
        let niche = niche.trim();
        if niche.is_empty() {
            return Err(AiError::InvalidInput("niche is required".to_string()));
        }
        if !(1..=MAX_GENERATED_PRODUCTS).contains(&product_count) {
            return Err(AiError::InvalidInput(format!(
                "product_count must be between 1 and {MAX_GENERATED_PRODUCTS}"
            )));
        }

        let output = self
            .complete(
                prompts::STORE_TEMPLATE_SYSTEM,
                &prompts::store_template_prompt(niche, product_count),
                8192,
            )
            .await?;

        parse_store_template(&output, product_count)
    }
}

fn finalize_seo(raw: RawSeo, input: &SeoInput) -> Result<SeoSuggestion, AiError> {
    let meta_title = truncate_at_word(&raw.meta_title, META_TITLE_MAX);
    if meta_title.is_empty() {
        return Err(AiError::Parse("model returned an empty meta_title".to_string()));
    }

    let focus_keyword = input
        .focus_keyword
        .as_deref()
        .or(raw.focus_keyword.as_deref())
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let slug = Some(slugify(raw.slug.as_deref().unwrap_or_default()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| slugify(&input.title));

    Ok(SeoSuggestion {
        meta_title,
        meta_description: truncate_at_word(&raw.meta_description, META_DESCRIPTION_MAX),
        focus_keyword,
        slug,
    })
}

fn validate_targets(input: &TranslateInput) -> Result<Vec<String>, AiError> {
    if input.text.trim().is_empty() {
        return Err(AiError::InvalidInput("text is required".to_string()));
    }

    let mut targets: Vec<String> = Vec::new();
    for target in &input.targets {
        let target = target.trim();
        if target.is_empty() {
            return Err(AiError::InvalidInput("target language is empty".to_string()));
        }
        if !targets.iter().any(|t| t.eq_ignore_ascii_case(target)) {
            targets.push(target.to_string());
        }
    }

    if targets.is_empty() || targets.len() > MAX_TRANSLATION_TARGETS {
        return Err(AiError::InvalidInput(format!(
            "between 1 and {MAX_TRANSLATION_TARGETS} target languages are required"
        )));
    }
    Ok(targets)
}

fn parse_store_template(output: &str, product_count: u32) -> Result<StoreTemplate, AiError> {
    let mut template: StoreTemplate = serde_json::from_value(extract_json(output)?)
        .map_err(|e| AiError::Parse(format!("unexpected template JSON: {e}")))?;

    template.products.truncate(product_count as usize);
    let handles: Vec<String> = template.products.iter().map(|p| p.handle()).collect();
    for collection in &mut template.collections {
        collection
            .products
            .retain(|h| handles.contains(&slugify(h)));
    }

    if template.products.is_empty() {
        return Err(AiError::Parse("generated template has no products".to_string()));
    }
    template
        .validate()
        .map_err(|e| AiError::Parse(format!("generated template is invalid: {e}")))?;

    Ok(template)
}

/// First balanced `{...}` object in model output that parses as JSON.
///
/// Tolerates prose and markdown fences around the object.
///
/// # Errors
///
/// Returns `AiError::Parse` if no JSON object is found.
pub fn extract_json(text: &str) -> Result<Value, AiError> {
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&text[start..]) {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..start + end]) {
                return Ok(value);
            }
        }
        search_from = start + 1;
    }

    Err(AiError::Parse("no JSON object in model output".to_string()))
}

/// Byte length of the object starting at `text[0] == '{'`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Drop a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // skip the info string ("html", "json", ...)
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::config::AiConfig;

    fn client() -> AiClient {
        AiClient::new(&AiConfig {
            api_key: SecretString::from("sk-test".to_string()),
            model: "claude-sonnet-4-20250514".to_string(),
            // unroutable; validation errors must return before any request
            api_url: "http://127.0.0.1:9/v1/messages".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_extract_json_from_fenced_output() {
        let output = "Here you go:\n```json\n{\"a\": {\"b\": \"}\"}, \"c\": 1}\n```\nEnjoy!";
        assert_eq!(extract_json(output).unwrap(), json!({"a": {"b": "}"}, "c": 1}));
    }

    #[test]
    fn test_extract_json_skips_invalid_candidates() {
        let output = "Use {braces} carefully. {\"ok\": true}";
        assert_eq!(extract_json(output).unwrap(), json!({"ok": true}));
        assert!(matches!(extract_json("no json"), Err(AiError::Parse(_))));
        assert!(matches!(extract_json("{\"open\": "), Err(AiError::Parse(_))));
    }

    #[test]
    fn test_finalize_seo_enforces_lengths() {
        let raw = RawSeo {
            meta_title: "Handmade Linen Shirts for Hot Summer Days and Cool Evenings in Lisbon".to_string(),
            meta_description: "word ".repeat(60),
            focus_keyword: Some("linen shirts".to_string()),
            slug: Some("Linen Shirts!".to_string()),
        };
        let input = SeoInput {
            title: "Shirts".to_string(),
            content: String::new(),
            focus_keyword: None,
            language: None,
        };
        let seo = finalize_seo(raw, &input).unwrap();
        assert!(seo.meta_title.chars().count() <= META_TITLE_MAX);
        assert!(seo.meta_description.chars().count() <= META_DESCRIPTION_MAX);
        assert_eq!(seo.focus_keyword, "linen shirts");
        assert_eq!(seo.slug, "linen-shirts");
    }

    #[test]
    fn test_finalize_seo_prefers_given_keyword_and_title_slug() {
        let raw = RawSeo {
            meta_title: "Title".to_string(),
            meta_description: String::new(),
            focus_keyword: Some("other".to_string()),
            slug: Some("???".to_string()),
        };
        let input = SeoInput {
            title: "Summer Sale".to_string(),
            content: String::new(),
            focus_keyword: Some("sale".to_string()),
            language: None,
        };
        let seo = finalize_seo(raw, &input).unwrap();
        assert_eq!(seo.focus_keyword, "sale");
        assert_eq!(seo.slug, "summer-sale");
    }

    #[test]
    fn test_validate_targets() {
        let input = |targets: &[&str]| TranslateInput {
            text: "Hello".to_string(),
            source: None,
            targets: targets.iter().map(ToString::to_string).collect(),
            html: false,
        };
        assert_eq!(
            validate_targets(&input(&["French", "french", "German"])).unwrap(),
            vec!["French", "German"]
        );
        assert!(validate_targets(&input(&[])).is_err());
        assert!(validate_targets(&input(&["fr", " "])).is_err());
        let eleven: Vec<String> = (0..11).map(|i| format!("lang{i}")).collect();
        let refs: Vec<&str> = eleven.iter().map(String::as_str).collect();
        assert!(validate_targets(&input(&refs)).is_err());
    }

    #[test]
    fn test_parse_store_template_trims_and_prunes() {
        let output = json!({
            "products": [
                {"title": "Mug", "price": "12.00"},
                {"title": "Bowl", "price": "20"},
                {"title": "Plate", "price": "15"}
            ],
            "collections": [{"title": "Tableware", "products": ["mug", "plate"]}],
            "pages": [{"title": "About", "body_html": "<p>Hi</p>"}]
        })
        .to_string();

        let template = parse_store_template(&output, 2).unwrap();
        assert_eq!(template.products.len(), 2);
        assert_eq!(template.collections[0].products, vec!["mug"]);
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```html\n<p>Hi</p>\n```"), "<p>Hi</p>");
        assert_eq!(strip_code_fence("  <p>Hi</p> "), "<p>Hi</p>");
    }

    #[tokio::test]
    async fn test_generators_validate_before_calling_provider() {
        let client = client();

        let err = client.generate_store_template("candles", 26).await.unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));

        let err = client.generate_store_template("  ", 5).await.unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));

        let err = client
            .generate_description(&DescriptionInput {
                product_name: String::new(),
                features: vec![],
                tone: None,
                language: None,
                max_words: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));

        let err = client
            .generate_seo(&SeoInput {
                title: " ".to_string(),
                content: "<p></p>".to_string(),
                focus_keyword: None,
                language: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }
}

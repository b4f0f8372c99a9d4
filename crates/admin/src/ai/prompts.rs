//! System prompts and prompt builders.

use std::fmt::Write as _;

use super::types::{DescriptionInput, SeoInput};

pub const SEO_SYSTEM: &str = "You are an SEO specialist for online stores. \
Reply with a single JSON object and nothing else, using the keys \
\"meta_title\" (at most 60 characters), \"meta_description\" (120 to 160 characters), \
\"focus_keyword\" (2 to 4 words) and \"slug\" (lowercase, hyphen separated). \
Do not invent facts that are not in the page content.";

pub const DESCRIPTION_SYSTEM: &str = "You write product descriptions for online stores. \
Reply with HTML only: short <p> paragraphs and, where useful, one <ul> of benefits. \
No headings, no inline styles, no markdown, no commentary.";

pub const TRANSLATE_SYSTEM: &str = "You are a professional translator for e-commerce content. \
Reply with the translation only, without quotes, notes or commentary. \
Keep product names, SKUs, numbers and units unchanged.";

pub const STORE_TEMPLATE_SYSTEM: &str = "You design demo catalogs for new Shopify stores. \
Reply with a single JSON object and nothing else, shaped as \
{\"products\": [{\"title\", \"handle\", \"body_html\", \"vendor\", \"product_type\", \
\"tags\": [string], \"price\": \"decimal string\", \"sku\"}], \
\"collections\": [{\"title\", \"body_html\", \"products\": [product handles]}], \
\"pages\": [{\"title\", \"body_html\"}]}. \
Handles are lowercase and hyphen separated. Include an About page and a Shipping page.";

pub fn seo_prompt(input: &SeoInput, excerpt: &str) -> String {
    let mut prompt = format!("Page title: {}\n", input.title.trim());
    if let Some(keyword) = input.focus_keyword.as_deref().filter(|k| !k.trim().is_empty()) {
        let _ = writeln!(prompt, "Focus keyword (use it verbatim): {}", keyword.trim());
    }
    let _ = writeln!(prompt, "Write in: {}", language(input.language.as_deref()));
    let _ = write!(prompt, "\nPage content:\n{excerpt}");
    prompt
}

pub fn description_prompt(input: &DescriptionInput, max_words: u32) -> String {
    let mut prompt = format!("Product: {}\n", input.product_name.trim());
    if !input.features.is_empty() {
        prompt.push_str("Features:\n");
        for feature in input.features.iter().filter(|f| !f.trim().is_empty()) {
            let _ = writeln!(prompt, "- {}", feature.trim());
        }
    }
    let _ = writeln!(
        prompt,
        "Tone: {}",
        input.tone.as_deref().unwrap_or("friendly and clear")
    );
    let _ = writeln!(prompt, "Language: {}", language(input.language.as_deref()));
    let _ = write!(prompt, "Length: at most {max_words} words.");
    prompt
}

pub fn translate_prompt(text: &str, source: Option<&str>, target: &str, html: bool) -> String {
    let from = source.map_or_else(String::new, |s| format!(" from {s}"));
    let markup = if html {
        " The text is HTML: translate the text content only and keep every tag and attribute exactly as is."
    } else {
        ""
    };
    format!("Translate the following{from} into {target}.{markup}\n\n{text}")
}

pub fn store_template_prompt(niche: &str, product_count: u32) -> String {
    format!(
        "Create a demo catalog for a store selling {niche}. \
         Exactly {product_count} products with realistic prices, \
         2 or 3 collections that group them, and 2 pages."
    )
}

fn language(language: Option<&str>) -> &str {
    language.map(str::trim).filter(|l| !l.is_empty()).unwrap_or("English")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seo_prompt_includes_keyword_and_language() {
        let input = SeoInput {
            title: "Linen shirts".to_string(),
            content: String::new(),
            focus_keyword: Some("linen shirt".to_string()),
            language: Some("German".to_string()),
        };
        let prompt = seo_prompt(&input, "Breathable shirts.");
        assert!(prompt.contains("Focus keyword (use it verbatim): linen shirt"));
        assert!(prompt.contains("Write in: German"));
        assert!(prompt.ends_with("Breathable shirts."));
    }

    #[test]
    fn test_translate_prompt_html_note() {
        let prompt = translate_prompt("<p>Hi</p>", Some("English"), "French", true);
        assert!(prompt.starts_with("Translate the following from English into French."));
        assert!(prompt.contains("keep every tag"));
        assert!(!translate_prompt("Hi", None, "French", false).contains("HTML"));
    }
}

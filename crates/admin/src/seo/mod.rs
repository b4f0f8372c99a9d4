//! SEO metadata helpers.
//!
//! - [`yoast`] - Yoast SEO custom fields on WordPress posts and WooCommerce products
//! - [`checklist`] - On-page checks with a 0-100 score

pub mod checklist;
pub mod yoast;

pub use checklist::{Checklist, ChecklistInput, ChecklistItem, CheckStatus, evaluate};
pub use yoast::YoastFields;

/// Recommended maximum length of an SEO title, in characters.
pub const META_TITLE_MAX: usize = 60;
/// Recommended maximum length of a meta description, in characters.
pub const META_DESCRIPTION_MAX: usize = 160;

/// URL slug: lowercase ASCII alphanumerics separated by single hyphens.
///
/// Common Latin accents are folded (`é` → `e`); other characters are dropped.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().map(fold_accent) {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || matches!(c, '-' | '_' | '/' | '.' | '&' | '+') {
            pending_hyphen = true;
        }
    }

    slug
}

const fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'ç' | 'Ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'È' | 'É' | 'Ê' | 'Ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'Ì' | 'Í' | 'Î' | 'Ï' => 'i',
        'ñ' | 'Ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'Ù' | 'Ú' | 'Û' | 'Ü' => 'u',
        'ý' | 'ÿ' | 'Ý' => 'y',
        'ß' => 's',
        other => other,
    }
}

/// Truncate to at most `max_chars` characters, cutting at a word boundary.
///
/// Falls back to a hard cut when the first word alone is too long. Trailing
/// punctuation left by the cut is removed.
#[must_use]
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let hard: String = text.chars().take(max_chars).collect();
    let next_is_boundary = text
        .chars()
        .nth(max_chars)
        .is_some_and(char::is_whitespace);

    let cut = if next_is_boundary {
        hard.as_str()
    } else {
        hard.rfind(char::is_whitespace)
            .map_or(hard.as_str(), |idx| &hard[..idx])
    };

    cut.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '-'))
        .to_string()
}

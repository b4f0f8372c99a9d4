//! On-page SEO checklist.
//!
//! Each check yields good, warning or problem. The score is the average of
//! the checks (good = 1, warning = 0.5, problem = 0) scaled to 0..=100.

use serde::{Deserialize, Serialize};

use super::{META_DESCRIPTION_MAX, META_TITLE_MAX, slugify};
use crate::builders::{ImageRef, html};

const TITLE_MIN: usize = 30;
const META_DESCRIPTION_MIN: usize = 120;
const CONTENT_GOOD_WORDS: usize = 300;
const CONTENT_MIN_WORDS: usize = 150;
const DENSITY_MIN: f64 = 0.5;
const DENSITY_MAX: f64 = 2.5;

/// Page to evaluate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChecklistInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub focus_keyword: Option<String>,
    /// Images outside `content_html` (builder layouts, featured image).
    /// `<img>` tags in the content are picked up automatically.
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Good,
    Warning,
    Problem,
}

impl CheckStatus {
    const fn weight(self) -> f64 {
        match self {
            Self::Good => 1.0,
            Self::Warning => 0.5,
            Self::Problem => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub status: CheckStatus,
    pub message: String,
}

impl ChecklistItem {
    fn new(id: &'static str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            id,
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Checklist {
    pub score: u8,
    pub items: Vec<ChecklistItem>,
}

impl Checklist {
    /// Look up a check by id.
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Run every applicable check.
#[must_use]
pub fn evaluate(input: &ChecklistInput) -> Checklist {
    let text = html::strip_tags(&input.content_html);
    let words = html::word_count(&text);

    let mut images = html::images(&input.content_html);
    images.extend(input.images.iter().cloned());

    let mut items = vec![
        length_check(
            "title_length",
            "SEO title",
            &input.title,
            TITLE_MIN,
            META_TITLE_MAX,
        ),
        length_check(
            "meta_description_length",
            "Meta description",
            &input.meta_description,
            META_DESCRIPTION_MIN,
            META_DESCRIPTION_MAX,
        ),
        content_length(words),
    ];

    let keyword = input
        .focus_keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    if let Some(keyword) = keyword {
        let needle = keyword.to_lowercase();
        items.push(contains_check(
            "keyword_in_title",
            "SEO title",
            &input.title,
            &needle,
            CheckStatus::Problem,
        ));
        items.push(contains_check(
            "keyword_in_meta_description",
            "Meta description",
            &input.meta_description,
            &needle,
            CheckStatus::Warning,
        ));
        items.push(keyword_in_slug(&input.slug, keyword));
        items.push(contains_check(
            "keyword_in_introduction",
            "Introduction",
            &html::first_paragraph(&input.content_html),
            &needle,
            CheckStatus::Warning,
        ));
        items.push(keyword_density(&text, words, &needle));
    }

    items.push(image_alt_text(&images));
    items.push(subheadings(&input.content_html));

    Checklist {
        score: score(&items),
        items,
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn score(items: &[ChecklistItem]) -> u8 {
    if items.is_empty() {
        return 0;
    }
    let total: f64 = items.iter().map(|item| item.status.weight()).sum();
    (total / items.len() as f64 * 100.0).round().clamp(0.0, 100.0) as u8
}

fn length_check(
    id: &'static str,
    label: &str,
    value: &str,
    min: usize,
    max: usize,
) -> ChecklistItem {
    let len = value.trim().chars().count();
    if len == 0 {
        ChecklistItem::new(id, CheckStatus::Problem, format!("{label} is missing."))
    } else if len < min {
        ChecklistItem::new(
            id,
            CheckStatus::Warning,
            format!("{label} is too short ({len} characters, aim for {min}-{max})."),
        )
    } else if len > max {
        ChecklistItem::new(
            id,
            CheckStatus::Warning,
            format!("{label} is too long ({len} characters, limit is {max})."),
        )
    } else {
        ChecklistItem::new(id, CheckStatus::Good, format!("{label} length is good."))
    }
}

fn content_length(words: usize) -> ChecklistItem {
    let id = "content_length";
    if words >= CONTENT_GOOD_WORDS {
        ChecklistItem::new(id, CheckStatus::Good, format!("Content has {words} words."))
    } else if words >= CONTENT_MIN_WORDS {
        ChecklistItem::new(
            id,
            CheckStatus::Warning,
            format!("Content has {words} words, aim for at least {CONTENT_GOOD_WORDS}."),
        )
    } else {
        ChecklistItem::new(
            id,
            CheckStatus::Problem,
            format!("Content has only {words} words."),
        )
    }
}

fn contains_check(
    id: &'static str,
    label: &str,
    haystack: &str,
    needle: &str,
    missing: CheckStatus,
) -> ChecklistItem {
    if haystack.to_lowercase().contains(needle) {
        ChecklistItem::new(id, CheckStatus::Good, format!("{label} contains the focus keyword."))
    } else {
        ChecklistItem::new(
            id,
            missing,
            format!("{label} does not contain the focus keyword."),
        )
    }
}

fn keyword_in_slug(slug: &str, keyword: &str) -> ChecklistItem {
    let id = "keyword_in_slug";
    let keyword_slug = slugify(keyword);
    let slug = slugify(slug);

    if !keyword_slug.is_empty() && slug.contains(&keyword_slug) {
        ChecklistItem::new(id, CheckStatus::Good, "Slug contains the focus keyword.")
    } else {
        ChecklistItem::new(
            id,
            CheckStatus::Warning,
            "Slug does not contain the focus keyword.",
        )
    }
}

#[allow(clippy::cast_precision_loss)]
fn keyword_density(text: &str, words: usize, needle: &str) -> ChecklistItem {
    let id = "keyword_density";
    if words == 0 {
        return ChecklistItem::new(id, CheckStatus::Problem, "No content to check.");
    }

    let occurrences = text.to_lowercase().matches(needle).count();
    let density = occurrences as f64 / words as f64 * 100.0;

    if occurrences == 0 {
        ChecklistItem::new(
            id,
            CheckStatus::Problem,
            "Focus keyword does not appear in the content.",
        )
    } else if density < DENSITY_MIN {
        ChecklistItem::new(
            id,
            CheckStatus::Warning,
            format!("Keyword density is {density:.1}%, aim for {DENSITY_MIN}-{DENSITY_MAX}%."),
        )
    } else if density > DENSITY_MAX {
        ChecklistItem::new(
            id,
            CheckStatus::Problem,
            format!("Keyword density is {density:.1}%, above {DENSITY_MAX}%."),
        )
    } else {
        ChecklistItem::new(
            id,
            CheckStatus::Good,
            format!("Keyword density is {density:.1}%."),
        )
    }
}

fn image_alt_text(images: &[ImageRef]) -> ChecklistItem {
    let id = "image_alt_text";
    if images.is_empty() {
        return ChecklistItem::new(id, CheckStatus::Warning, "No images found.");
    }

    let missing = images.iter().filter(|image| image.alt.is_none()).count();
    if missing == 0 {
        ChecklistItem::new(id, CheckStatus::Good, "All images have alt text.")
    } else {
        ChecklistItem::new(
            id,
            CheckStatus::Problem,
            format!("{missing} of {} images have no alt text.", images.len()),
        )
    }
}

fn subheadings(content_html: &str) -> ChecklistItem {
    if html::has_subheadings(content_html) {
        ChecklistItem::new("subheadings", CheckStatus::Good, "Content uses subheadings.")
    } else {
        ChecklistItem::new(
            "subheadings",
            CheckStatus::Warning,
            "Content has no subheadings.",
        )
    }
}

//! Integration tests for the WordPress content pipeline.
//!
//! A post as returned by `GET /wp/v2/posts/{id}?context=edit` is fed through
//! builder extraction, Yoast field mapping and the SEO checklist.

use serde_json::{Value, json};

use merchdesk_admin::builders::{self, Builder, TextKind};
use merchdesk_admin::seo::{CheckStatus, ChecklistInput, YoastFields, evaluate};
use merchdesk_admin::tables::WpPostRow;
use merchdesk_admin::woocommerce::MetaData;
use merchdesk_admin::wordpress::WpPost;

fn elementor_post() -> WpPost {
    let layout = json!([
        {
            "id": "s1",
            "elType": "section",
            "settings": {"background_image": {"url": "https://cdn.acme.test/hero.jpg"}},
            "elements": [
                {
                    "id": "c1",
                    "elType": "column",
                    "settings": {},
                    "elements": [
                        {
                            "id": "w1",
                            "elType": "widget",
                            "widgetType": "heading",
                            "settings": {"title": "Handmade ceramic mugs"}
                        },
                        {
                            "id": "w2",
                            "elType": "widget",
                            "widgetType": "text-editor",
                            "settings": {"editor": "<p>Every mug is thrown by hand in our studio.</p>"}
                        },
                        {
                            "id": "w3",
                            "elType": "widget",
                            "widgetType": "image",
                            "settings": {"image": {"url": "https://cdn.acme.test/mug.jpg", "alt": "Blue mug"}}
                        },
                        {
                            "id": "w4",
                            "elType": "widget",
                            "widgetType": "button",
                            "settings": {"text": "Shop &amp; save"}
                        }
                    ]
                }
            ]
        }
    ]);

    serde_json::from_value(json!({
        "id": 42,
        "date": "2026-03-01T10:00:00",
        "modified": "2026-03-02T09:30:00",
        "slug": "handmade-ceramic-mugs",
        "status": "publish",
        "type": "page",
        "link": "https://acme.test/handmade-ceramic-mugs/",
        "title": {"rendered": "Handmade &#8220;Ceramic&#8221; Mugs", "raw": "Handmade \u{201c}Ceramic\u{201d} Mugs"},
        "content": {"rendered": "<p>fallback</p>", "raw": ""},
        "excerpt": {"rendered": ""},
        "author": 1,
        "featured_media": 0,
        "meta": {
            "_elementor_edit_mode": "builder",
            "_elementor_data": layout.to_string(),
            "_yoast_wpseo_title": "Handmade Ceramic Mugs | Acme",
            "_yoast_wpseo_focuskw": "ceramic mugs",
            "_yoast_wpseo_meta-robots-noindex": "1"
        }
    }))
    .expect("valid WordPress post")
}

#[test]
fn test_elementor_post_extraction() {
    let post = elementor_post();
    let content = builders::extract(&post.meta, post.content.source()).expect("valid layout");

    assert_eq!(content.builder, Builder::Elementor);

    let kinds: Vec<TextKind> = content.texts.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TextKind::Heading, TextKind::Paragraph, TextKind::Button]
    );
    assert_eq!(
        content.texts.last().map(|t| t.text.as_str()),
        Some("Shop & save")
    );

    let urls: Vec<&str> = content.images.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://cdn.acme.test/hero.jpg", "https://cdn.acme.test/mug.jpg"]
    );
    assert!(content.word_count > 0);
}

#[test]
fn test_classic_post_uses_content_html() {
    let post: WpPost = serde_json::from_value(json!({
        "id": 7,
        "title": {"rendered": "Spring lookbook"},
        "content": {
            "rendered": "",
            "raw": "<h2>Spring</h2>[caption]<img src=\"https://cdn.acme.test/look.png\" alt=\"Look\">[/caption]<p>New arrivals.</p>"
        },
        "meta": []
    }))
    .expect("valid WordPress post");

    assert!(post.meta.is_empty());

    let content = builders::extract(&post.meta, post.content.source()).expect("classic content");
    assert_eq!(content.builder, Builder::Classic);
    assert!(content.texts.iter().any(|t| t.text == "New arrivals."));
    assert_eq!(content.images.len(), 1);
}

#[test]
fn test_broken_elementor_data_is_an_error() {
    let post: WpPost = serde_json::from_value(json!({
        "id": 9,
        "meta": {"_elementor_edit_mode": "builder", "_elementor_data": "[{not json"}
    }))
    .expect("valid WordPress post");

    assert!(builders::extract(&post.meta, post.content.source()).is_err());
}

#[test]
fn test_yoast_fields_move_between_platforms() {
    let post = elementor_post();
    let yoast = YoastFields::from_wp_meta(&post.meta);

    assert_eq!(yoast.title.as_deref(), Some("Handmade Ceramic Mugs | Acme"));
    assert_eq!(yoast.focus_keyword.as_deref(), Some("ceramic mugs"));
    assert_eq!(yoast.noindex, Some(true));
    assert!(yoast.description.is_none());

    // the same fields written to a WooCommerce product read back unchanged
    let meta_data: Vec<MetaData> = yoast.to_woo_meta_data();
    assert_eq!(YoastFields::from_woo_meta_data(&meta_data), yoast);

    let wp_meta = yoast.to_wp_meta();
    assert_eq!(
        wp_meta.get("_yoast_wpseo_meta-robots-noindex"),
        Some(&Value::String("1".to_string()))
    );
    assert!(!wp_meta.contains_key("_yoast_wpseo_metadesc"));
}

#[test]
fn test_table_row_from_post() {
    let row = WpPostRow::from(elementor_post());
    assert_eq!(row.title, "Handmade \u{201c}Ceramic\u{201d} Mugs");
    assert_eq!(row.seo_title.as_deref(), Some("Handmade Ceramic Mugs | Acme"));
    assert_eq!(row.focus_keyword.as_deref(), Some("ceramic mugs"));
}

#[test]
fn test_checklist_over_extracted_content() {
    let post = elementor_post();
    let content = builders::extract(&post.meta, post.content.source()).expect("valid layout");
    let yoast = YoastFields::from_wp_meta(&post.meta);

    let content_html = content
        .texts
        .iter()
        .map(|t| match t.kind {
            TextKind::Heading => format!("<h2>{}</h2>", t.text),
            _ => format!("<p>{}</p>", t.text),
        })
        .collect::<String>();

    let checklist = evaluate(&ChecklistInput {
        title: yoast.title.unwrap_or_default(),
        meta_description: String::new(),
        slug: post.slug,
        content_html,
        focus_keyword: yoast.focus_keyword,
        images: content.images,
    });

    let status = |id: &str| checklist.item(id).map(|item| item.status);
    assert_eq!(status("meta_description_length"), Some(CheckStatus::Problem));
    assert_eq!(status("keyword_in_title"), Some(CheckStatus::Good));
    assert_eq!(status("keyword_in_slug"), Some(CheckStatus::Good));
    // the background image has no alt text
    assert_eq!(status("image_alt_text"), Some(CheckStatus::Problem));
    assert!(checklist.score < 100);
}

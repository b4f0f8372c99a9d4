//! Elementor `_elementor_data` extraction.
//!
//! The data is a JSON array of elements. Each element has an `elType`
//! (`section`, `container`, `column`, `widget`), a `settings` object, and
//! child `elements`. Widgets also carry a `widgetType`.

use serde_json::Value;

use super::{BuilderError, ImageRef, TextBlock, TextKind, html};

/// Extract text and images from Elementor data, depth first in document order.
///
/// # Errors
///
/// Returns `BuilderError::InvalidJson` if the data is not valid JSON, or
/// `BuilderError::UnexpectedShape` if it is not an array of elements.
pub fn extract(data: &Value) -> Result<(Vec<TextBlock>, Vec<ImageRef>), BuilderError> {
    let parsed;
    let root = match data {
        // Stored as a JSON string in post meta
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw)
                .map_err(|e| BuilderError::InvalidJson(format!("_elementor_data: {e}")))?;
            &parsed
        }
        other => other,
    };

    let Value::Array(elements) = root else {
        return Err(BuilderError::UnexpectedShape(
            "_elementor_data is not an array".to_string(),
        ));
    };

    let mut texts = Vec::new();
    let mut images = Vec::new();
    for element in elements {
        walk(element, &mut texts, &mut images);
    }

    Ok((texts, images))
}

fn walk(element: &Value, texts: &mut Vec<TextBlock>, images: &mut Vec<ImageRef>) {
    let settings = element.get("settings").unwrap_or(&Value::Null);

    if let Some(url) = setting_str(settings.get("background_image"), "url") {
        images.push(ImageRef::new(url, None));
    }

    if element.get("elType").and_then(Value::as_str) == Some("widget") {
        let widget = element
            .get("widgetType")
            .and_then(Value::as_str)
            .unwrap_or_default();
        widget_content(widget, settings, texts, images);
    }

    if let Some(children) = element.get("elements").and_then(Value::as_array) {
        for child in children {
            walk(child, texts, images);
        }
    }
}

fn widget_content(
    widget: &str,
    settings: &Value,
    texts: &mut Vec<TextBlock>,
    images: &mut Vec<ImageRef>,
) {
    let mut text = |kind: TextKind, key: &str, is_html: bool| {
        if let Some(raw) = settings.get(key).and_then(Value::as_str) {
            let value = if is_html {
                html::strip_tags(raw)
            } else {
                html::decode_entities(raw).trim().to_string()
            };
            if !value.is_empty() {
                texts.push(TextBlock::new(kind, value));
            }
        }
    };

    match widget {
        "heading" => text(TextKind::Heading, "title", true),
        "text-editor" => text(TextKind::Paragraph, "editor", true),
        "button" => text(TextKind::Button, "text", false),
        "icon-box" => {
            text(TextKind::Heading, "title_text", true);
            text(TextKind::Paragraph, "description_text", true);
        }
        "image-box" => {
            text(TextKind::Heading, "title_text", true);
            text(TextKind::Paragraph, "description_text", true);
            image_setting(settings, images);
        }
        "testimonial" => text(TextKind::Quote, "testimonial_content", true),
        "image" => image_setting(settings, images),
        "image-gallery" => {
            if let Some(gallery) = settings.get("wp_gallery").and_then(Value::as_array) {
                for item in gallery {
                    if let Some(url) = setting_str(Some(item), "url") {
                        images.push(ImageRef::new(url, None));
                    }
                }
            }
        }
        _ => {}
    }
}

/// `settings.image.url` with alt from `settings.image.alt`.
fn image_setting(settings: &Value, images: &mut Vec<ImageRef>) {
    let image = settings.get("image");
    if let Some(url) = setting_str(image, "url") {
        images.push(ImageRef::new(url, setting_str(image, "alt")));
    }
}

fn setting_str<'a>(object: Option<&'a Value>, key: &str) -> Option<&'a str> {
    object?
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!([
            {
                "id": "a1", "elType": "section",
                "settings": {"background_image": {"url": "https://cdn.example.com/hero.jpg", "id": 3}},
                "elements": [{
                    "id": "b1", "elType": "column", "settings": {},
                    "elements": [
                        {"id": "c1", "elType": "widget", "widgetType": "heading",
                         "settings": {"title": "Summer &amp; Sun"}, "elements": []},
                        {"id": "c2", "elType": "widget", "widgetType": "text-editor",
                         "settings": {"editor": "<p>Light <strong>linen</strong> shirts.</p>"}, "elements": []},
                        {"id": "c3", "elType": "widget", "widgetType": "image",
                         "settings": {"image": {"url": "https://cdn.example.com/shirt.jpg", "alt": "Linen shirt"}}, "elements": []},
                        {"id": "c4", "elType": "widget", "widgetType": "button",
                         "settings": {"text": "Shop now"}, "elements": []}
                    ]
                }]
            }
        ])
    }

    #[test]
    fn test_extracts_in_document_order() {
        let (texts, images) = extract(&sample()).unwrap();
        let values: Vec<_> = texts.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(values, vec!["Summer & Sun", "Light linen shirts.", "Shop now"]);
        assert_eq!(texts[0].kind, TextKind::Heading);
        assert_eq!(texts[2].kind, TextKind::Button);

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].url, "https://cdn.example.com/hero.jpg");
        assert_eq!(images[1].alt.as_deref(), Some("Linen shirt"));
    }

    #[test]
    fn test_accepts_json_string() {
        let raw = Value::String(sample().to_string());
        let (texts, _) = extract(&raw).unwrap();
        assert_eq!(texts.len(), 3);
    }

    #[test]
    fn test_gallery_and_testimonial() {
        let data = json!([{"elType": "widget", "widgetType": "image-gallery",
            "settings": {"wp_gallery": [{"id": 1, "url": "https://x/1.png"}, {"id": 2, "url": "https://x/2.png"}]}},
            {"elType": "widget", "widgetType": "testimonial",
            "settings": {"testimonial_content": "Great fit!"}}]);
        let (texts, images) = extract(&data).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(texts[0].kind, TextKind::Quote);
    }

    #[test]
    fn test_invalid_json_string() {
        let err = extract(&Value::String("[{broken".to_string())).unwrap_err();
        assert!(matches!(err, BuilderError::InvalidJson(_)));
    }

    #[test]
    fn test_non_array_is_rejected() {
        let err = extract(&json!({"elements": []})).unwrap_err();
        assert!(matches!(err, BuilderError::UnexpectedShape(_)));
    }
}

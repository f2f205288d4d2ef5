//! Media reference extraction from fetched page content.
//!
//! A pure transformation over already-fetched HTML: no network or disk I/O,
//! deterministic and order-stable across re-runs.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::models::{MediaCategory, MediaItem};
use crate::utils::{derive_filename, resolve};

/// Element/attribute pairs that can carry a media reference.
const MEDIA_SOURCES: &[(&str, &str)] = &[
    ("img", "src"),
    ("video", "src"),
    ("source", "src"),
    ("a", "href"),
];

/// Scan page content for media references.
///
/// Candidates must end in an allow-listed extension (case-insensitive suffix
/// match on the raw attribute value); survivors are resolved against
/// `base_url` and carry the element's descriptive attributes plus `page_url`.
/// Content with no recognizable references yields an empty vec, never an
/// error.
pub fn extract(html: &str, base_url: &str, page_url: &str) -> Vec<MediaItem> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            debug!("Cannot extract from {}: invalid base URL: {}", base_url, e);
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    let mut items = Vec::new();

    for &(tag, attr) in MEDIA_SOURCES {
        let selector = match Selector::parse(tag) {
            Ok(selector) => selector,
            Err(_) => continue,
        };

        for element in document.select(&selector) {
            let value = match element.value().attr(attr) {
                Some(value) if !value.trim().is_empty() => value.trim(),
                _ => continue,
            };

            let category = match classify_reference(value) {
                Some(category) => category,
                None => continue,
            };

            let url = match resolve(value, &base) {
                Some(url) => url,
                None => continue,
            };

            items.push(MediaItem {
                filename: derive_filename(&url),
                url,
                category,
                source_tag: element.value().name().to_string(),
                alt_text: element.value().attr("alt").unwrap_or("").to_string(),
                title_text: element.value().attr("title").unwrap_or("").to_string(),
                page_url: page_url.to_string(),
            });
        }
    }

    items
}

/// Classify a raw reference by its extension suffix.
///
/// Returns `None` when the value does not end in an allow-listed media
/// extension (including values with query strings or fragments appended,
/// which are deliberately not treated as media).
fn classify_reference(value: &str) -> Option<MediaCategory> {
    let lower = value.to_ascii_lowercase();
    let (stem, extension) = lower.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    match MediaCategory::from_extension(extension) {
        MediaCategory::Other => None,
        category => Some(category),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://site.test/list?page=1";

    fn extract_from(html: &str) -> Vec<MediaItem> {
        extract(html, PAGE_URL, PAGE_URL)
    }

    #[test]
    fn test_extracts_all_supported_elements() {
        let html = r#"
            <html><body>
                <img src="/img/a.png" alt="first" title="A">
                <video src="clips/b.mp4"></video>
                <picture><source src="//cdn.test/c.webp"></picture>
                <a href="https://files.test/d.pdf">report</a>
            </body></html>
        "#;
        let items = extract_from(html);
        assert_eq!(items.len(), 4);
        assert_eq!(items[0].url, "https://site.test/img/a.png");
        assert_eq!(items[0].category, MediaCategory::Image);
        assert_eq!(items[1].url, "https://site.test/clips/b.mp4");
        assert_eq!(items[1].category, MediaCategory::Video);
        assert_eq!(items[2].url, "https://cdn.test/c.webp");
        assert_eq!(items[3].url, "https://files.test/d.pdf");
        assert_eq!(items[3].category, MediaCategory::Document);
    }

    #[test]
    fn test_captures_descriptive_attributes() {
        let html = r#"<img src="x.jpg" alt="a cat" title="Cat photo">"#;
        let items = extract_from(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_tag, "img");
        assert_eq!(items[0].alt_text, "a cat");
        assert_eq!(items[0].title_text, "Cat photo");
        assert_eq!(items[0].page_url, PAGE_URL);
    }

    #[test]
    fn test_missing_attributes_are_empty() {
        let items = extract_from(r#"<img src="x.jpg">"#);
        assert_eq!(items[0].alt_text, "");
        assert_eq!(items[0].title_text, "");
    }

    #[test]
    fn test_rejects_non_media_references() {
        let html = r##"
            <a href="/about.html">about</a>
            <a href="/download?id=3">dynamic</a>
            <a href="/pic.png?size=big">query suffix</a>
            <img src="">
            <a href="#top">anchor</a>
        "##;
        assert!(extract_from(html).is_empty());
    }

    #[test]
    fn test_suffix_match_is_case_insensitive() {
        let items = extract_from(r#"<img src="photo.JPG">"#);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, MediaCategory::Image);
    }

    #[test]
    fn test_extraction_is_order_stable() {
        let html = r#"<img src="a.png"><img src="b.png"><a href="c.mp3">c</a>"#;
        let first = extract_from(html);
        let second = extract_from(html);
        assert_eq!(first, second);
        assert!(first[0].url.ends_with("a.png"));
        assert!(first[1].url.ends_with("b.png"));
    }

    #[test]
    fn test_invalid_base_yields_empty() {
        assert!(extract(r#"<img src="a.png">"#, "not a url", "not a url").is_empty());
    }
}

//! Media item model and extension-based classification.

use serde::{Deserialize, Serialize};

/// Image file extensions (without leading dot).
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "svg", "ico", "heic", "jfif",
];

/// Video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "avi", "mov", "wmv", "flv", "mkv", "m4v", "3gp", "mpeg", "mpg",
];

/// Audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma", "opus"];

/// Document file extensions.
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx"];

/// Coarse file-type bucket determining the storage subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    Image,
    Video,
    Audio,
    Document,
    Other,
}

impl MediaCategory {
    /// Classify a file extension. Case-insensitive; a leading dot is allowed.
    /// Unrecognized extensions map to `Other`.
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            MediaCategory::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            MediaCategory::Video
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            MediaCategory::Audio
        } else if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
            MediaCategory::Document
        } else {
            MediaCategory::Other
        }
    }

    /// Storage subdirectory name for this category.
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaCategory::Image => "Images",
            MediaCategory::Video => "Videos",
            MediaCategory::Audio => "Audio",
            MediaCategory::Document => "Documents",
            MediaCategory::Other => "Others",
        }
    }

    /// The serialized name of the category, as written to metadata records.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Image => "image",
            MediaCategory::Video => "video",
            MediaCategory::Audio => "audio",
            MediaCategory::Document => "document",
            MediaCategory::Other => "other",
        }
    }
}

/// One discovered downloadable asset plus its descriptive metadata.
///
/// Created once by extraction and immutable afterwards. The canonical `url`
/// is the identity key for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Canonical absolute URL; the dedup and identity key.
    pub url: String,
    /// Derived local filename, collision-resistant across pages.
    pub filename: String,
    /// File-type bucket derived from the URL's extension.
    pub category: MediaCategory,
    /// HTML element kind the reference was found in.
    #[serde(rename = "tag")]
    pub source_tag: String,
    /// Alternative text from the element, empty if absent.
    #[serde(rename = "alt")]
    pub alt_text: String,
    /// Title text from the element, empty if absent.
    #[serde(rename = "title")]
    pub title_text: String,
    /// The listing page on which the asset was found.
    pub page_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_category() {
        assert_eq!(MediaCategory::from_extension("png"), MediaCategory::Image);
        assert_eq!(MediaCategory::from_extension("webm"), MediaCategory::Video);
        assert_eq!(MediaCategory::from_extension("flac"), MediaCategory::Audio);
        assert_eq!(
            MediaCategory::from_extension("pdf"),
            MediaCategory::Document
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(MediaCategory::from_extension("JPG"), MediaCategory::Image);
        assert_eq!(MediaCategory::from_extension("Mp4"), MediaCategory::Video);
    }

    #[test]
    fn test_classify_allows_leading_dot() {
        assert_eq!(MediaCategory::from_extension(".ogg"), MediaCategory::Audio);
        assert_eq!(
            MediaCategory::from_extension(".docx"),
            MediaCategory::Document
        );
    }

    #[test]
    fn test_classify_unknown_is_other() {
        assert_eq!(MediaCategory::from_extension("exe"), MediaCategory::Other);
        assert_eq!(MediaCategory::from_extension(""), MediaCategory::Other);
    }

    #[test]
    fn test_dir_names() {
        assert_eq!(MediaCategory::Image.dir_name(), "Images");
        assert_eq!(MediaCategory::Video.dir_name(), "Videos");
        assert_eq!(MediaCategory::Audio.dir_name(), "Audio");
        assert_eq!(MediaCategory::Document.dir_name(), "Documents");
        assert_eq!(MediaCategory::Other.dir_name(), "Others");
    }

    #[test]
    fn test_item_serializes_with_original_field_names() {
        let item = MediaItem {
            url: "https://site.test/a.png".to_string(),
            filename: "a_12345678.png".to_string(),
            category: MediaCategory::Image,
            source_tag: "img".to_string(),
            alt_text: "logo".to_string(),
            title_text: String::new(),
            page_url: "https://site.test/list?page=1".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["tag"], "img");
        assert_eq!(json["alt"], "logo");
        assert_eq!(json["category"], "image");
    }
}

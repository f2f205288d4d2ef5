//! Metadata persistence: JSON, CSV, and the failed-URL list.
//!
//! Reruns overwrite; writes go to a temporary sibling and rename into place
//! so consumers never observe a half-written file.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::models::MediaItem;

/// Column order of the CSV, matching the metadata schema.
const CSV_HEADER: &str = "url,filename,category,tag,alt,title,page_url";

/// Persist the full collection as a pretty-printed JSON array and a flat
/// CSV. An empty collection still produces the JSON array but skips the CSV
/// entirely - no header-only files.
pub fn write_metadata(
    items: &[MediaItem],
    json_path: &Path,
    csv_path: &Path,
) -> anyhow::Result<()> {
    write_json(items, json_path)?;
    if items.is_empty() {
        debug!("No media items; skipping CSV");
    } else {
        write_csv(items, csv_path)?;
    }
    Ok(())
}

/// Load a previously persisted metadata JSON array.
pub fn load_metadata(path: &Path) -> anyhow::Result<Vec<MediaItem>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read metadata file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid metadata file {}", path.display()))
}

/// Write permanently failed URLs, one per line, for a future rerun.
/// Nothing is written when there are no failures.
pub fn write_failed_urls(urls: &[String], path: &Path) -> anyhow::Result<()> {
    if urls.is_empty() {
        return Ok(());
    }
    let body = format!("{}\n", urls.join("\n"));
    atomic_write(path, body.as_bytes())?;
    info!("Wrote {} failed URLs to {}", urls.len(), path.display());
    Ok(())
}

fn write_json(items: &[MediaItem], path: &Path) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(items)?;
    atomic_write(path, body.as_bytes())?;
    info!("Saved metadata JSON to {}", path.display());
    Ok(())
}

fn write_csv(items: &[MediaItem], path: &Path) -> anyhow::Result<()> {
    let mut body = String::with_capacity(items.len() * 128);
    body.push_str(CSV_HEADER);
    body.push('\n');
    for item in items {
        let fields = [
            item.url.as_str(),
            item.filename.as_str(),
            item.category.as_str(),
            item.source_tag.as_str(),
            item.alt_text.as_str(),
            item.title_text.as_str(),
            item.page_url.as_str(),
        ];
        let row: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
        body.push_str(&row.join(","));
        body.push('\n');
    }
    atomic_write(path, body.as_bytes())?;
    info!("Saved metadata CSV to {}", path.display());
    Ok(())
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(field: &str) -> String {
    if field
        .chars()
        .any(|c| matches!(c, ',' | '"' | '\n' | '\r'))
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Write to a temporary sibling and rename into place.
fn atomic_write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("could not create {}", parent.display()))?;
        }
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("metadata");
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    fs::write(&tmp, bytes).with_context(|| format!("could not write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("could not replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaCategory;

    fn sample_item(url: &str) -> MediaItem {
        MediaItem {
            url: url.to_string(),
            filename: "a_00000000.png".to_string(),
            category: MediaCategory::Image,
            source_tag: "img".to_string(),
            alt_text: "plain".to_string(),
            title_text: String::new(),
            page_url: "https://site.test/list?page=1".to_string(),
        }
    }

    #[test]
    fn test_empty_collection_writes_json_but_no_csv() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("media_files.json");
        let csv = dir.path().join("media_files.csv");

        write_metadata(&[], &json, &csv).unwrap();

        assert_eq!(fs::read_to_string(&json).unwrap().trim(), "[]");
        assert!(!csv.exists());
    }

    #[test]
    fn test_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("media_files.json");
        let csv = dir.path().join("media_files.csv");
        let items = vec![
            sample_item("https://site.test/a.png"),
            sample_item("https://site.test/b.png"),
        ];

        write_metadata(&items, &json, &csv).unwrap();

        let loaded = load_metadata(&json).unwrap();
        assert_eq!(loaded, items);
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("media_files.json");
        let csv = dir.path().join("media_files.csv");
        let items = vec![sample_item("https://site.test/a.png")];

        write_metadata(&items, &json, &csv).unwrap();

        let content = fs::read_to_string(&csv).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CSV_HEADER);
        assert!(lines[1].starts_with("https://site.test/a.png,"));
    }

    #[test]
    fn test_csv_quotes_fields_with_delimiters() {
        let mut item = sample_item("https://site.test/a.png");
        item.alt_text = "cats, \"and\" dogs".to_string();

        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("media_files.json");
        let csv = dir.path().join("media_files.csv");
        write_metadata(&[item], &json, &csv).unwrap();

        let content = fs::read_to_string(&csv).unwrap();
        assert!(content.contains(r#""cats, ""and"" dogs""#));
    }

    #[test]
    fn test_failed_urls_skipped_when_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed_downloads.txt");
        write_failed_urls(&[], &path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_urls_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed_downloads.txt");
        let urls = vec![
            "https://site.test/a.png".to_string(),
            "https://site.test/b.png".to_string(),
        ];
        write_failed_urls(&urls, &path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "https://site.test/a.png\nhttps://site.test/b.png\n"
        );
    }

    #[test]
    fn test_rerun_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("media_files.json");
        let csv = dir.path().join("media_files.csv");

        write_metadata(&[sample_item("https://site.test/a.png")], &json, &csv).unwrap();
        write_metadata(&[sample_item("https://site.test/b.png")], &json, &csv).unwrap();

        let loaded = load_metadata(&json).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url, "https://site.test/b.png");
    }
}

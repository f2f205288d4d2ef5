//! URL resolution and local filename derivation.

use sha2::{Digest, Sha256};
use url::Url;

/// Resolve a possibly-relative reference against a base URL.
///
/// Absolute references pass through unchanged; protocol-relative
/// (`//host/path`), root-relative (`/path`), and relative references are
/// joined with standard URL semantics. Returns `None` for references the
/// base cannot absorb (e.g. `mailto:` with garbage).
pub fn resolve(reference: &str, base: &Url) -> Option<String> {
    base.join(reference.trim()).ok().map(|u| u.to_string())
}

/// Derive a collision-resistant local filename from a canonical URL.
///
/// Takes the last path segment (query stripped), defaulting to `file` when
/// empty, and inserts an 8-hex-character hash of the full URL before the
/// extension. Two pages reusing a basename such as `icon.png` therefore
/// never map to the same local name.
pub fn derive_filename(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Not an absolute URL; fall back to the raw string minus any query.
        Err(_) => url.split('?').next().unwrap_or(url).to_string(),
    };

    let basename = path.rsplit('/').next().unwrap_or("");
    let basename = if basename.is_empty() { "file" } else { basename };

    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    let hash = &digest[..8];

    match basename.rfind('.') {
        Some(pos) if pos > 0 => format!("{}_{}{}", &basename[..pos], hash, &basename[pos..]),
        _ => format!("{}_{}", basename, hash),
    }
}

/// Rewrite the `page` query parameter of a listing URL, preserving every
/// other parameter. Appends the parameter when absent.
pub fn with_page_param(base: &Url, page: u32) -> Url {
    let pairs: Vec<(String, String)> = base
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query.clear();
        let mut replaced = false;
        for (key, value) in &pairs {
            if key == "page" {
                query.append_pair("page", &page.to_string());
                replaced = true;
            } else {
                query.append_pair(key, value);
            }
        }
        if !replaced {
            query.append_pair("page", &page.to_string());
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.test/gallery/list?page=1").unwrap()
    }

    #[test]
    fn test_resolve_absolute_is_unchanged() {
        let absolute = "https://cdn.test/assets/photo.jpg";
        assert_eq!(resolve(absolute, &base()).unwrap(), absolute);
    }

    #[test]
    fn test_resolve_protocol_relative_inherits_scheme() {
        assert_eq!(
            resolve("//cdn.test/a.png", &base()).unwrap(),
            "https://cdn.test/a.png"
        );
    }

    #[test]
    fn test_resolve_root_relative_uses_origin() {
        assert_eq!(
            resolve("/media/b.mp4", &base()).unwrap(),
            "https://site.test/media/b.mp4"
        );
    }

    #[test]
    fn test_resolve_relative_uses_base_directory() {
        assert_eq!(
            resolve("thumbs/c.gif", &base()).unwrap(),
            "https://site.test/gallery/thumbs/c.gif"
        );
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let a = resolve("img/x.png", &base());
        let b = resolve("img/x.png", &base());
        assert_eq!(a, b);
    }

    #[test]
    fn test_filenames_differ_for_shared_basenames() {
        let a = derive_filename("https://a.test/x/icon.png");
        let b = derive_filename("https://b.test/y/icon.png");
        assert_ne!(a, b);
        assert!(a.starts_with("icon_"));
        assert!(a.ends_with(".png"));
        assert!(b.ends_with(".png"));
    }

    #[test]
    fn test_filename_strips_query() {
        let name = derive_filename("https://a.test/img/photo.jpg?size=large");
        assert!(name.starts_with("photo_"));
        assert!(name.ends_with(".jpg"));
    }

    #[test]
    fn test_filename_defaults_when_path_is_bare() {
        let name = derive_filename("https://a.test/");
        assert!(name.starts_with("file_"));
        // No extension to preserve: the hash ends the name.
        assert_eq!(name.len(), "file_".len() + 8);
    }

    #[test]
    fn test_filename_is_stable() {
        let url = "https://a.test/x/icon.png";
        assert_eq!(derive_filename(url), derive_filename(url));
    }

    #[test]
    fn test_with_page_param_replaces_existing() {
        let url = with_page_param(&base(), 7);
        assert_eq!(url.as_str(), "https://site.test/gallery/list?page=7");
    }

    #[test]
    fn test_with_page_param_preserves_other_params() {
        let base = Url::parse("https://site.test/list?sort=new&page=2&q=cats").unwrap();
        let url = with_page_param(&base, 3);
        assert_eq!(url.as_str(), "https://site.test/list?sort=new&page=3&q=cats");
    }

    #[test]
    fn test_with_page_param_appends_when_missing() {
        let base = Url::parse("https://site.test/list?sort=new").unwrap();
        let url = with_page_param(&base, 2);
        assert_eq!(url.as_str(), "https://site.test/list?sort=new&page=2");
    }
}

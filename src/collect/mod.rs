//! Bundle asset path collection from serialized page markup.
//!
//! Three sources are unioned: script-tag `src` attributes, preload-link
//! `href` attributes, and a regex scan of the raw markup. All are filtered
//! to the bundle URL signature and deduplicated by exact string equality —
//! `/x.js` and `x.js` are two distinct paths at this stage.

mod download;

pub use download::{download_all, FileContentMap};

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;

/// URL substring that marks a framework bundle asset.
const BUNDLE_MARKER: &str = "/_next/";

/// Raw-markup scan for static bundle chunk references.
const BUNDLE_PATH_PATTERN: &str = r#"/_next/static/[^"'\s]+\.js"#;

/// Fixed suffix for debug companion (sourcemap) files.
pub const COMPANION_SUFFIX: &str = ".map";

/// A discovered bundle file location: archive-relative destination plus
/// absolute fetch target. Created during collection, immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub path: String,
    pub url: String,
}

/// Scan the markup for unique bundle asset paths, insertion-ordered.
pub fn collect_asset_paths(html: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut paths: Vec<String> = Vec::new();
    let mut push = |p: &str| {
        if seen.insert(p.to_string()) {
            paths.push(p.to_string());
        }
    };

    let doc = Html::parse_document(html);

    if let Ok(sel) = Selector::parse("script[src]") {
        for script in doc.select(&sel) {
            if let Some(src) = script.value().attr("src") {
                if src.contains(BUNDLE_MARKER) {
                    push(src);
                }
            }
        }
    }

    if let Ok(sel) = Selector::parse(r#"link[rel="preload"][as="script"]"#) {
        for link in doc.select(&sel) {
            if let Some(href) = link.value().attr("href") {
                if href.contains(BUNDLE_MARKER) {
                    push(href);
                }
            }
        }
    }

    // Chunks referenced only from inline loader code never appear as tags;
    // the raw scan picks those up.
    if let Ok(re) = Regex::new(BUNDLE_PATH_PATTERN) {
        for m in re.find_iter(html) {
            push(m.as_str());
        }
    }

    paths
}

/// Resolve collected paths to absolute fetch URLs and, when the companion
/// option is on, derive exactly one `.map` sibling per original. No
/// existence check is made for companions — the downloader tolerates 404s.
pub fn prepare_file_urls(
    paths: &[String],
    origin: &str,
    include_companions: bool,
) -> Vec<AssetReference> {
    let mut refs = Vec::with_capacity(if include_companions {
        paths.len() * 2
    } else {
        paths.len()
    });

    for path in paths {
        let url = resolve_url(path, origin);
        refs.push(AssetReference {
            path: path.clone(),
            url: url.clone(),
        });

        if include_companions {
            refs.push(AssetReference {
                path: format!("{path}{COMPANION_SUFFIX}"),
                url: format!("{url}{COMPANION_SUFFIX}"),
            });
        }
    }

    refs
}

fn resolve_url(path: &str, origin: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let origin = origin.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_from_script_tags() {
        let html = r#"
            <script src="/_next/static/chunks/main-abc.js"></script>
            <script src="/assets/analytics.js"></script>
        "#;
        let paths = collect_asset_paths(html);
        assert_eq!(paths, vec!["/_next/static/chunks/main-abc.js"]);
    }

    #[test]
    fn test_collect_from_preload_links() {
        let html = r#"
            <link rel="preload" as="script" href="/_next/static/chunks/pages/_app-def.js">
            <link rel="preload" as="style" href="/_next/static/css/styles.css">
            <link rel="stylesheet" href="/_next/static/css/other.css">
        "#;
        let paths = collect_asset_paths(html);
        assert_eq!(paths, vec!["/_next/static/chunks/pages/_app-def.js"]);
    }

    #[test]
    fn test_collect_from_raw_markup_scan() {
        // Referenced only inside an inline loader, not as a tag attribute.
        let html = r#"<script>loadChunk("/_next/static/chunks/lazy-123.js")</script>"#;
        let paths = collect_asset_paths(html);
        assert_eq!(paths, vec!["/_next/static/chunks/lazy-123.js"]);
    }

    #[test]
    fn test_duplicates_across_sources_appear_once() {
        let html = r#"
            <link rel="preload" as="script" href="/_next/static/chunks/main-abc.js">
            <script src="/_next/static/chunks/main-abc.js"></script>
            <script>preload("/_next/static/chunks/main-abc.js")</script>
        "#;
        let paths = collect_asset_paths(html);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_no_separator_insensitive_dedup() {
        // Exact string equality only: the same logical file with and
        // without a leading slash stays two entries.
        let html = r#"
            <script src="/_next/static/x.js"></script>
            <script src="a/_next/static/x.js"></script>
        "#;
        let paths = collect_asset_paths(html);
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_prepare_resolves_against_origin() {
        let paths = vec!["/_next/static/chunks/a.js".to_string()];
        let refs = prepare_file_urls(&paths, "https://example.com", false);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].url, "https://example.com/_next/static/chunks/a.js");
        assert_eq!(refs[0].path, "/_next/static/chunks/a.js");
    }

    #[test]
    fn test_prepare_passes_absolute_urls_through() {
        let paths = vec!["https://cdn.example.com/_next/static/a.js".to_string()];
        let refs = prepare_file_urls(&paths, "https://example.com", false);
        assert_eq!(refs[0].url, "https://cdn.example.com/_next/static/a.js");
    }

    #[test]
    fn test_companion_option_adds_one_sibling_per_path() {
        let paths = vec![
            "/_next/static/a.js".to_string(),
            "/_next/static/b.js".to_string(),
        ];
        let refs = prepare_file_urls(&paths, "https://example.com", true);
        assert_eq!(refs.len(), 4);
        assert_eq!(refs[1].path, "/_next/static/a.js.map");
        assert_eq!(refs[1].url, "https://example.com/_next/static/a.js.map");
        assert_eq!(refs[3].path, "/_next/static/b.js.map");
    }

    #[test]
    fn test_empty_html_yields_no_paths() {
        assert!(collect_asset_paths("").is_empty());
        assert!(collect_asset_paths("<html><body>hi</body></html>").is_empty());
    }
}

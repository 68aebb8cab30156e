//! Link harvesting, URL resolution and internal/external classification.
//!
//! Two producers feed one filter:
//! - [`anchor_candidates`] resolves every usable `<a href>` against the base URL;
//! - [`text_candidates`] scans the page text for `http(s)://` and bare `www.` tokens.
//!
//! Every candidate goes through [`admit`] before it lands in the result set.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::dom::Node;

/// Path suffixes of files that are not page content.
pub const NON_CONTENT_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".zip", ".rar", ".7z", ".jpg", ".jpeg", ".png", ".gif",
    ".css", ".js", ".ico", ".xml", ".json",
];

/// References that are already absolute or must never be joined to a base.
const PASSTHROUGH_PREFIXES: &[&str] = &["http://", "https://", "mailto:", "tel:", "data:"];

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', '!', '?', ')'];

static HTTP_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"{}|\\^`\[\]]+"#).expect("Failed to compile http URL regex"));
static WWW_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)www\.[^\s<>"{}|\\^`\[\]]+"#).expect("Failed to compile www URL regex"));

/// A harvested link with text and resolved URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Resolved URL
    pub url: String,
    /// Link text content
    pub text: String,
}

/// Whether a URL points at the base document's site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkScope {
    Internal,
    External,
}

/// Request-scoped rules for which URLs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPolicy {
    /// Keep URLs on the base host or its sub-domains.
    pub include_internal: bool,
    /// Keep URLs on any other host.
    pub include_external: bool,
    /// Cap on the number of URLs returned. `None` and `Some(0)` mean no cap.
    pub max_links: Option<usize>,
    /// Drop URLs whose path ends in one of [`NON_CONTENT_EXTENSIONS`].
    pub exclude_file_types: bool,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        Self { include_internal: true, include_external: true, max_links: None, exclude_file_types: false }
    }
}

/// Resolve an `href`/`src` value against the base URL.
///
/// Absolute http(s), `mailto:`, `tel:` and `data:` references are returned
/// unchanged, as is anything that cannot be joined.
pub fn resolve_reference(reference: &str, base: Option<&Url>) -> String {
    let lowered = reference.to_ascii_lowercase();
    if PASSTHROUGH_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
        return reference.to_string();
    }

    match base.map(|b| b.join(reference)) {
        Some(Ok(resolved)) => resolved.to_string(),
        _ => reference.to_string(),
    }
}

/// Classify `url` relative to the base host: exact match or sub-domain is internal.
pub fn classify(url: &Url, base_host: Option<&str>) -> LinkScope {
    match (url.host_str(), base_host) {
        (Some(host), Some(base)) if is_same_site(host, base) => LinkScope::Internal,
        _ => LinkScope::External,
    }
}

fn is_same_site(host: &str, base: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let base = base.to_ascii_lowercase();
    host == base
        || host
            .strip_suffix(base.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Whether the URL path ends in a known non-content file extension.
pub fn has_non_content_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    NON_CONTENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// The single admission predicate shared by both producers.
pub fn admit(url: &Url, base_host: Option<&str>, policy: &LinkPolicy) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }

    let allowed = match classify(url, base_host) {
        LinkScope::Internal => policy.include_internal,
        LinkScope::External => policy.include_external,
    };

    allowed && !(policy.exclude_file_types && has_non_content_extension(url))
}

/// Every `<a href>` that is non-empty and not a fragment, resolved against `base`.
pub fn anchor_candidates(root: &Node, base: &Url) -> Vec<Url> {
    root.walk()
        .filter(|node| node.tag == "a")
        .filter_map(|node| node.attr("href"))
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| base.join(href).ok())
        .collect()
}

/// URL-looking tokens in free text. Bare `www.` tokens become `https://`.
/// Matches that do not parse as absolute URLs are dropped.
pub fn text_candidates(text: &str) -> Vec<Url> {
    HTTP_URL_RE
        .find_iter(text)
        .chain(WWW_URL_RE.find_iter(text))
        .filter_map(|m| {
            let cleaned = m.as_str().trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c));
            let candidate = if cleaned.to_ascii_lowercase().starts_with("www.") {
                format!("https://{cleaned}")
            } else {
                cleaned.to_string()
            };
            Url::parse(&candidate).ok()
        })
        .collect()
}

/// Extract the deduplicated, classified URL list of a document.
///
/// The list is ordered lexicographically; when `max_links` applies, which
/// URLs survive the cap is not part of the contract.
pub fn extract_urls(root: &Node, base: &Url, policy: &LinkPolicy) -> Vec<String> {
    let base_host = base.host_str();
    let page_text = root.text_runs().join("\n");

    let anchors = anchor_candidates(root, base);
    let in_text = text_candidates(&page_text);
    let (anchor_count, text_count) = (anchors.len(), in_text.len());

    let set: BTreeSet<String> = anchors
        .into_iter()
        .chain(in_text)
        .filter(|url| admit(url, base_host, policy))
        .map(String::from)
        .collect();

    let mut urls: Vec<String> = set.into_iter().collect();
    if let Some(max) = policy.max_links.filter(|&max| max > 0) {
        urls.truncate(max);
    }

    tracing::debug!(anchor_count, text_count, kept = urls.len(), "urls extracted");

    urls
}

/// Harvest `<a href>` links with their text. Links without href or text are skipped.
pub fn extract_links(root: &Node, base: Option<&Url>) -> Vec<LinkRecord> {
    root.walk()
        .filter(|node| node.tag == "a")
        .filter_map(|node| {
            let href = node.attr("href").filter(|h| !h.is_empty())?;
            let text = node.text().trim().to_string();
            if text.is_empty() {
                return None;
            }
            Some(LinkRecord { url: resolve_reference(href, base), text })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::dom::Document;

    fn base() -> Url {
        Url::parse("https://example.com/path/").unwrap()
    }

    #[test]
    fn test_classify_internal_external() {
        let host = Some("example.com");
        assert_eq!(classify(&Url::parse("https://example.com/x").unwrap(), host), LinkScope::Internal);
        assert_eq!(classify(&Url::parse("https://sub.example.com/x").unwrap(), host), LinkScope::Internal);
        assert_eq!(classify(&Url::parse("https://other.com/x").unwrap(), host), LinkScope::External);
        assert_eq!(classify(&Url::parse("https://notexample.com/x").unwrap(), host), LinkScope::External);
    }

    #[test]
    fn test_classify_without_base_host() {
        assert_eq!(classify(&Url::parse("https://example.com").unwrap(), None), LinkScope::External);
    }

    #[test]
    fn test_admit_rejects_bad_scheme() {
        let policy = LinkPolicy::default();
        assert!(!admit(&Url::parse("ftp://example.com/x").unwrap(), Some("example.com"), &policy));
        assert!(!admit(&Url::parse("mailto:a@example.com").unwrap(), Some("example.com"), &policy));
    }

    #[test]
    fn test_admit_honours_scope_flags() {
        let internal_only = LinkPolicy { include_external: false, ..Default::default() };
        let external_only = LinkPolicy { include_internal: false, ..Default::default() };
        let inside = Url::parse("https://example.com/a").unwrap();
        let outside = Url::parse("https://other.org/a").unwrap();

        assert!(admit(&inside, Some("example.com"), &internal_only));
        assert!(!admit(&outside, Some("example.com"), &internal_only));
        assert!(!admit(&inside, Some("example.com"), &external_only));
        assert!(admit(&outside, Some("example.com"), &external_only));
    }

    #[test]
    fn test_admit_file_type_exclusion() {
        let pdf = Url::parse("https://example.com/Report.PDF").unwrap();
        assert!(admit(&pdf, Some("example.com"), &LinkPolicy::default()));

        let policy = LinkPolicy { exclude_file_types: true, ..Default::default() };
        assert!(!admit(&pdf, Some("example.com"), &policy));
        assert!(admit(&Url::parse("https://example.com/report").unwrap(), Some("example.com"), &policy));
    }

    #[test]
    fn test_resolve_reference() {
        let base = Url::parse("https://ex.com/dir/page").unwrap();
        assert_eq!(resolve_reference("/x", Some(&base)), "https://ex.com/x");
        assert_eq!(resolve_reference("y.png", Some(&base)), "https://ex.com/dir/y.png");
        assert_eq!(resolve_reference("//cdn.ex.com/a", Some(&base)), "https://cdn.ex.com/a");
        assert_eq!(resolve_reference("https://other.com/p", Some(&base)), "https://other.com/p");
    }

    #[test]
    fn test_resolve_reference_passthrough() {
        let base = Url::parse("https://ex.com/").unwrap();
        assert_eq!(resolve_reference("mailto:a@b.c", Some(&base)), "mailto:a@b.c");
        assert_eq!(resolve_reference("tel:+123", Some(&base)), "tel:+123");
        assert_eq!(resolve_reference("data:image/png;base64,AAA", Some(&base)), "data:image/png;base64,AAA");
        assert_eq!(resolve_reference("/rel", None), "/rel");
    }

    #[test]
    fn test_anchor_candidates_skip_fragments_and_empty() {
        let doc = Document::parse(
            r##"<body><a href="#top">top</a><a href="">empty</a><a>none</a><a href="about">ok</a></body>"##,
        );
        let urls = anchor_candidates(doc.root(), &base());
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].as_str(), "https://example.com/path/about");
    }

    #[test]
    fn test_text_candidates_strip_punctuation() {
        let urls = text_candidates("See https://a.com/x). Or (http://b.org/y, then!");
        let urls: Vec<String> = urls.into_iter().map(String::from).collect();
        assert!(urls.contains(&"https://a.com/x".to_string()));
        assert!(urls.contains(&"http://b.org/y".to_string()));
    }

    #[test]
    fn test_text_candidates_www_rewrite() {
        let urls = text_candidates("visit www.example.org today");
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].as_str(), "https://www.example.org/");
    }

    #[test]
    fn test_extract_urls_merges_and_dedups() {
        let doc = Document::parse(
            r#"<body><a href="/about">About</a><a href="https://example.com/about">Again</a>
            <p>Also at https://example.com/about and https://other.net/page.</p></body>"#,
        );
        let urls = extract_urls(doc.root(), &base(), &LinkPolicy::default());
        assert_eq!(urls, vec!["https://example.com/about".to_string(), "https://other.net/page".to_string()]);
    }

    #[test]
    fn test_extract_urls_cap() {
        let anchors: String = (0..50).map(|i| format!(r#"<a href="/p{i}">p</a>"#)).collect();
        let doc = Document::parse(&format!("<body>{anchors}</body>"));

        let capped = LinkPolicy { max_links: Some(10), ..Default::default() };
        assert_eq!(extract_urls(doc.root(), &base(), &capped).len(), 10);

        let uncapped = LinkPolicy { max_links: Some(0), ..Default::default() };
        assert_eq!(extract_urls(doc.root(), &base(), &uncapped).len(), 50);
    }

    #[test]
    fn test_extract_links_basic() {
        let doc = Document::parse(r#"<body><a href="/about">About</a><a href="contact">Contact</a></body>"#);
        let links = extract_links(doc.root(), Some(&base()));

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].text, "About");
        assert_eq!(links[0].url, "https://example.com/about");
        assert_eq!(links[1].text, "Contact");
        assert_eq!(links[1].url, "https://example.com/path/contact");
    }

    #[test]
    fn test_extract_links_skips_empty_text() {
        let doc = Document::parse(r#"<body><a href="https://example.com">   </a></body>"#);
        assert!(extract_links(doc.root(), Some(&base())).is_empty());
    }

    #[test]
    fn test_extract_links_multiline_text() {
        let doc = Document::parse(
            r#"<body><a href="https://example.com">
                Line 1
                Line 2
            </a></body>"#,
        );
        let links = extract_links(doc.root(), None);
        assert_eq!(links.len(), 1);
        assert!(links[0].text.contains("Line 1"));
        assert!(links[0].text.contains("Line 2"));
    }

    #[test]
    fn test_unparseable_text_matches_are_dropped() {
        let text = "bad https://) then http://[::bad and http://:80, good https://good.example/x";
        let found: Vec<String> = text_candidates(text).into_iter().map(String::from).collect();
        assert_eq!(found, vec!["https://good.example/x"]);

        let doc = Document::parse(&format!("<body><p>{text}</p></body>"));
        assert_eq!(extract_urls(doc.root(), &base(), &LinkPolicy::default()), vec!["https://good.example/x"]);
    }
}

//! Boilerplate removal.
//!
//! Drops whole subtrees by tag name, or by substring match against the
//! literal `class`/`id` attribute value, and strips comments.

use super::dom::{Child, Node};

/// Tags removed outright together with their descendants.
const REMOVED_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "noscript", "iframe", "embed", "object", "applet", "form",
    "input", "button", "select", "textarea", "meta", "link", "title", "head",
];

/// Lowercase substrings that mark an element as boilerplate.
const BOILERPLATE_PATTERNS: &[&str] = &[
    "nav", "menu", "sidebar", "footer", "header", "ad", "banner", "popup", "modal", "cookie", "social", "share",
    "comment", "related", "recommend",
];

/// What the sanitizer removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalPolicy {
    /// Tag names to drop.
    pub tags: &'static [&'static str],
    /// Lowercase substrings matched against the `class` attribute.
    pub class_patterns: &'static [&'static str],
    /// Lowercase substrings matched against the `id` attribute.
    pub id_patterns: &'static [&'static str],
}

impl RemovalPolicy {
    /// The process-wide default policy.
    pub const DEFAULT: RemovalPolicy =
        RemovalPolicy { tags: REMOVED_TAGS, class_patterns: BOILERPLATE_PATTERNS, id_patterns: BOILERPLATE_PATTERNS };

    /// Whether `node` should be removed.
    pub fn matches(&self, node: &Node) -> bool {
        self.tags.contains(&node.tag.as_str())
            || node.attr("class").is_some_and(|value| contains_any(value, self.class_patterns))
            || node.attr("id").is_some_and(|value| contains_any(value, self.id_patterns))
    }
}

impl Default for RemovalPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn contains_any(value: &str, patterns: &[&str]) -> bool {
    let value = value.to_lowercase();
    patterns.iter().any(|pattern| value.contains(pattern))
}

/// Remove every matching subtree and every comment below `node`, in place.
///
/// `node` itself is never removed. Running it twice is a no-op.
pub fn sanitize(node: &mut Node, policy: &RemovalPolicy) {
    node.children.retain(|child| match child {
        Child::Element(element) => !policy.matches(element),
        Child::Text(_) => true,
        Child::Comment(_) => false,
    });

    for child in &mut node.children {
        if let Child::Element(element) = child {
            sanitize(element, policy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::dom::Document;

    fn sanitized(html: &str) -> Node {
        let mut root = Document::parse(html).root().clone();
        sanitize(&mut root, &RemovalPolicy::DEFAULT);
        root
    }

    #[test]
    fn test_removes_tags() {
        let root = sanitized("<body><script>x()</script><nav>menu</nav><p>keep</p></body>");
        assert!(root.find("script").is_none());
        assert!(root.find("nav").is_none());
        assert_eq!(root.find("p").unwrap().text(), "keep");
    }

    #[test]
    fn test_removes_head_and_title() {
        let root = sanitized("<html><head><title>T</title></head><body><p>b</p></body></html>");
        assert!(root.find("head").is_none());
        assert!(root.find("title").is_none());
    }

    #[test]
    fn test_removes_by_class_substring_case_insensitive() {
        let root = sanitized(r#"<body><div class="Site-NAVIGATION">x</div><div class="story">keep</div></body>"#);
        assert_eq!(root.find_all("div").count(), 1);
        assert!(root.text().contains("keep"));
    }

    #[test]
    fn test_removes_by_id_substring() {
        let root = sanitized(r#"<body><div id="cookie-banner">x</div><div id="story">keep</div></body>"#);
        assert!(!root.text().contains('x'));
        assert!(root.text().contains("keep"));
    }

    #[test]
    fn test_ad_pattern_is_a_plain_substring() {
        // "shadow" contains "ad"
        let root = sanitized(r#"<body><div class="shadow">gone</div></body>"#);
        assert!(!root.text().contains("gone"));
    }

    #[test]
    fn test_removes_descendants_with_parent() {
        let root = sanitized(r#"<body><aside><p>inner</p></aside></body>"#);
        assert!(root.find("p").is_none());
    }

    #[test]
    fn test_strips_comments() {
        let root = sanitized("<body><p>a<!-- note -->b</p></body>");
        let p = root.find("p").unwrap();
        assert!(p.children.iter().all(|c| !matches!(c, Child::Comment(_))));
    }

    #[test]
    fn test_no_match_is_noop() {
        let original = Document::parse("<body><article><p>plain</p></article></body>").root().clone();
        let mut root = original.clone();
        sanitize(&mut root, &RemovalPolicy::DEFAULT);
        assert_eq!(root, original);
    }

    #[test]
    fn test_idempotent() {
        let html = r#"<html><head><title>t</title></head><body>
            <div class="menu">m</div><!-- c --><main><p>text</p><footer>f</footer></main></body></html>"#;
        let once = sanitized(html);
        let mut twice = once.clone();
        sanitize(&mut twice, &RemovalPolicy::DEFAULT);
        assert_eq!(once, twice);
    }
}

//! Main-content localization.
//!
//! Selectors are tried in a fixed order. The first selector whose largest
//! match carries more than [`MIN_CONTENT_CHARS`] characters of text wins,
//! even if a later selector would match something bigger.

use super::dom::{Node, body_of};

/// Minimum text length (exclusive) for a match to count as main content.
pub const MIN_CONTENT_CHARS: usize = 100;

/// One entry of the main-content priority list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSelector {
    /// Element tag name.
    Tag(&'static str),
    /// A token of the `class` attribute.
    Class(&'static str),
    /// The `id` attribute.
    Id(&'static str),
}

impl ContentSelector {
    pub fn matches(&self, node: &Node) -> bool {
        match *self {
            ContentSelector::Tag(tag) => node.tag == tag,
            ContentSelector::Class(class) => node.has_class(class),
            ContentSelector::Id(id) => node.attr("id") == Some(id),
        }
    }
}

/// Main-content selectors in priority order.
pub const MAIN_CONTENT_SELECTORS: &[ContentSelector] = &[
    ContentSelector::Tag("main"),
    ContentSelector::Tag("article"),
    ContentSelector::Class("content"),
    ContentSelector::Class("main-content"),
    ContentSelector::Class("post-content"),
    ContentSelector::Class("entry-content"),
    ContentSelector::Class("article-content"),
    ContentSelector::Class("page-content"),
    ContentSelector::Id("content"),
    ContentSelector::Id("main"),
    ContentSelector::Id("article"),
    ContentSelector::Id("post"),
    ContentSelector::Id("entry"),
];

/// The main content region, else `body`, else `root` itself.
pub fn locate_main_content(root: &Node) -> &Node {
    find_main_content(root).or_else(|| body_of(root)).unwrap_or(root)
}

/// The main content region, if any selector produces a large enough match.
pub fn find_main_content(root: &Node) -> Option<&Node> {
    for selector in MAIN_CONTENT_SELECTORS {
        let mut best: Option<(&Node, usize)> = None;

        for candidate in root.walk().filter(|node| selector.matches(node)) {
            let len = candidate.text().chars().count();
            if best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((candidate, len));
            }
        }

        if let Some((node, len)) = best
            && len > MIN_CONTENT_CHARS
        {
            tracing::debug!(?selector, chars = len, "main content located");
            return Some(node);
        }
    }

    None
}

//! Owned DOM tree built from a lenient html5ever parse.
//!
//! `scraper` does the parsing; the result is copied into a plain owned tree
//! so the sanitizer can prune it with ordinary `Vec::retain` and every call
//! owns its tree outright.

use std::collections::BTreeMap;

use scraper::node::Node as ParsedNode;
use scraper::{ElementRef, Html};

/// Deepest element nesting kept as structure. Anything below collapses into
/// one text run on the element at this depth, so every recursive pass over
/// the tree stays bounded.
pub const MAX_DEPTH: usize = 256;

/// A child of an element: another element, a text run, or a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Element(Node),
    Text(String),
    Comment(String),
}

/// An element with its attributes and ordered children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    /// Lowercase tag name.
    pub tag: String,
    /// Attribute name to value.
    pub attrs: BTreeMap<String, String>,
    /// Children in document order.
    pub children: Vec<Child>,
}

impl Node {
    /// Create an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), ..Default::default() }
    }

    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Whether the whitespace-separated `class` list contains `token`.
    pub fn has_class(&self, token: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == token))
    }

    /// Heading level for `h1`..`h6`.
    pub fn heading_level(&self) -> Option<u8> {
        match self.tag.as_bytes() {
            [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
            _ => None,
        }
    }

    /// Concatenated text of all descendant text runs. Comments are skipped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for run in self.text_runs() {
            out.push_str(run);
        }
        out
    }

    /// Descendant text runs in document order.
    pub fn text_runs(&self) -> Vec<&str> {
        let mut runs = Vec::new();
        collect_text_runs(self, &mut runs);
        runs
    }

    /// Direct element children.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Node> {
        self.children.iter().filter_map(|child| match child {
            Child::Element(node) => Some(node),
            _ => None,
        })
    }

    /// Pre-order walk over this element and every descendant element.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }

    /// Pre-order walk over descendant elements, excluding `self`.
    pub fn descendants(&self) -> impl Iterator<Item = &Node> {
        self.walk().skip(1)
    }

    /// First descendant element with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Node> {
        self.descendants().find(|node| node.tag == tag)
    }

    /// Every descendant element with the given tag, in document order.
    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.descendants().filter(move |node| node.tag == tag)
    }

    /// Whether `other` is this exact element or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        self.walk().any(|node| std::ptr::eq(node, other))
    }
}

fn collect_text_runs<'a>(node: &'a Node, runs: &mut Vec<&'a str>) {
    for child in &node.children {
        match child {
            Child::Text(text) => runs.push(text),
            Child::Element(element) => collect_text_runs(element, runs),
            Child::Comment(_) => {}
        }
    }
}

/// Pre-order element iterator backed by an explicit stack.
pub struct Walk<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.elements().rev());
        Some(node)
    }
}

/// A parsed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Parse HTML. Never fails: malformed input still yields a tree with at
    /// least an `html` element.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        Self { root: convert(parsed.root_element(), 0) }
    }

    /// The `html` element.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The `body` element, if the parser produced one.
    pub fn body(&self) -> Option<&Node> {
        body_of(&self.root)
    }
}

/// `node` itself if it is a `body`, else its first `body` descendant.
pub fn body_of(node: &Node) -> Option<&Node> {
    node.walk().find(|n| n.tag == "body")
}

fn convert(element: ElementRef<'_>, depth: usize) -> Node {
    let value = element.value();
    let mut node = Node {
        tag: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(name, val)| (name.to_ascii_lowercase(), val.to_string()))
            .collect(),
        children: Vec::new(),
    };

    if depth >= MAX_DEPTH {
        let text: String = element.text().collect();
        if !text.is_empty() {
            node.children.push(Child::Text(text));
        }
        return node;
    }

    for child in element.children() {
        match child.value() {
            ParsedNode::Text(text) => node.children.push(Child::Text(String::from(&*text.text))),
            ParsedNode::Comment(comment) => node.children.push(Child::Comment(String::from(&*comment.comment))),
            ParsedNode::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    node.children.push(Child::Element(convert(child_el, depth + 1)));
                }
            }
            _ => {}
        }
    }

    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_builds_html_root() {
        let doc = Document::parse("<p>hi</p>");
        assert_eq!(doc.root().tag, "html");
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_parse_never_fails_on_garbage() {
        let doc = Document::parse("<div><p>unclosed <b>bold</div></span></html>tail");
        assert_eq!(doc.root().tag, "html");
        assert!(doc.root().text().contains("bold"));
    }

    #[test]
    fn test_parse_keeps_comments_out_of_text() {
        let doc = Document::parse("<body><p>a<!-- hidden -->b</p></body>");
        let p = doc.root().find("p").unwrap();
        assert_eq!(p.text(), "ab");
        assert!(p.children.iter().any(|c| matches!(c, Child::Comment(_))));
    }

    #[test]
    fn test_walk_is_document_order() {
        let doc = Document::parse("<body><div><h1>a</h1><p>b</p></div><h2>c</h2></body>");
        let tags: Vec<&str> = doc
            .root()
            .descendants()
            .filter(|n| n.heading_level().is_some() || n.tag == "p")
            .map(|n| n.tag.as_str())
            .collect();
        assert_eq!(tags, vec!["h1", "p", "h2"]);
    }

    #[test]
    fn test_has_class_matches_tokens() {
        let doc = Document::parse(r#"<body><div class="post  content main">x</div></body>"#);
        let div = doc.root().find("div").unwrap();
        assert!(div.has_class("content"));
        assert!(!div.has_class("cont"));
    }

    #[test]
    fn test_heading_level() {
        assert_eq!(Node::new("h3").heading_level(), Some(3));
        assert_eq!(Node::new("h7").heading_level(), None);
        assert_eq!(Node::new("hr").heading_level(), None);
        assert_eq!(Node::new("header").heading_level(), None);
    }

    #[test]
    fn test_contains_is_identity_based() {
        let doc = Document::parse("<body><div><p>x</p></div><p>x</p></body>");
        let div = doc.root().find("div").unwrap();
        let ps: Vec<&Node> = doc.root().find_all("p").collect();
        assert!(div.contains(ps[0]));
        assert!(!div.contains(ps[1]));
    }

    fn nested_divs(levels: usize, inner: &str) -> String {
        format!("{}{}{}", "<div>".repeat(levels), inner, "</div>".repeat(levels))
    }

    fn max_nesting(node: &Node) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(node, 1)];
        while let Some((current, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(current.elements().map(|child| (child, depth + 1)));
        }
        deepest
    }

    #[test]
    fn test_deep_nesting_is_capped() {
        let doc = Document::parse(&nested_divs(5_000, "<span>deep</span> text"));
        assert!(max_nesting(doc.root()) <= MAX_DEPTH + 1);
        assert_eq!(doc.root().text(), "deep text");
    }

    #[test]
    fn test_shallow_nesting_keeps_structure() {
        let doc = Document::parse(&nested_divs(50, "<b>x</b>"));
        assert_eq!(doc.root().find("b").map(Node::text), Some("x".to_string()));
    }
}

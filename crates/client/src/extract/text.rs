//! Plain-text and structured views of a page.

use serde::{Deserialize, Serialize};
use url::Url;

use super::dom::Node;
use super::links::{LinkRecord, extract_links};
use super::locate::locate_main_content;
use super::metadata::{HeadingRecord, ImageRecord, extract_headings, extract_images, extract_title};
use super::sanitize::{RemovalPolicy, sanitize};

/// Text of this many characters or fewer is treated as noise.
pub const MIN_TEXT_CHARS: usize = 10;

/// Title, body text, outline, links and images in one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub title: String,
    pub content: String,
    pub headings: Vec<HeadingRecord>,
    pub links: Vec<LinkRecord>,
    pub images: Vec<ImageRecord>,
}

/// Whitespace-collapsed text of the main content region of a sanitized copy.
pub fn extract_text_content(root: &Node, policy: &RemovalPolicy) -> String {
    let mut tree = root.clone();
    sanitize(&mut tree, policy);

    let joined = locate_main_content(&tree)
        .text_runs()
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");

    if joined.chars().count() > MIN_TEXT_CHARS { joined } else { String::new() }
}

pub fn extract_structured_content(root: &Node, base: Option<&Url>, content: String) -> StructuredContent {
    StructuredContent {
        title: extract_title(root),
        content,
        headings: extract_headings(root),
        links: extract_links(root, base),
        images: extract_images(root),
    }
}

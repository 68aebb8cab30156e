//! Page metadata from the unsanitized document.
//!
//! Each field is extracted independently and falls back to its empty value.

use serde::{Deserialize, Serialize};

use super::dom::Node;

/// Maximum characters kept from a paragraph used as the description.
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// A paragraph must be longer than this to serve as the description.
pub const DESCRIPTION_MIN_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRecord {
    /// 1 through 6.
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// `src` as written in the document.
    pub src: String,
    /// Empty when the image has no `alt`.
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    /// Number of non-empty rows.
    pub rows: usize,
    /// Cell count of the first row.
    pub columns: usize,
    /// Cell text, row-major.
    pub data: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub headings: Vec<HeadingRecord>,
    pub images: Vec<ImageRecord>,
    pub tables: Vec<TableRecord>,
}

pub fn extract_metadata(root: &Node) -> PageMetadata {
    PageMetadata {
        title: extract_title(root),
        description: extract_description(root),
        headings: extract_headings(root),
        images: extract_images(root),
        tables: extract_tables(root),
    }
}

/// `<title>` text, else the first `<h1>`, else empty.
pub fn extract_title(root: &Node) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|tag| root.walk().find(|node| node.tag == *tag))
        .map(|node| node.text().trim().to_string())
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// `<meta name="description">` content, else the first paragraph (truncated).
pub fn extract_description(root: &Node) -> String {
    let meta = root.walk().find(|node| {
        node.tag == "meta"
            && node
                .attr("name")
                .is_some_and(|name| name.eq_ignore_ascii_case("description"))
    });
    if let Some(meta) = meta {
        return meta.attr("content").unwrap_or("").trim().to_string();
    }

    let Some(paragraph) = root.find("p") else {
        return String::new();
    };

    let text = paragraph.text();
    let text = text.trim();
    let len = text.chars().count();
    if len <= DESCRIPTION_MIN_CHARS {
        String::new()
    } else if len > DESCRIPTION_MAX_CHARS {
        let truncated: String = text.chars().take(DESCRIPTION_MAX_CHARS).collect();
        format!("{truncated}...")
    } else {
        text.to_string()
    }
}

/// Non-empty `h1`..`h6` in document order.
pub fn extract_headings(root: &Node) -> Vec<HeadingRecord> {
    root.walk()
        .filter_map(|node| {
            let level = node.heading_level()?;
            let text = node.text().trim().to_string();
            (!text.is_empty()).then_some(HeadingRecord { level, text })
        })
        .collect()
}

/// Every `<img>` with a non-empty `src`.
pub fn extract_images(root: &Node) -> Vec<ImageRecord> {
    root.walk()
        .filter(|node| node.tag == "img")
        .filter_map(|img| {
            let src = img.attr("src").filter(|src| !src.is_empty())?;
            Some(ImageRecord { src: src.to_string(), alt: img.attr("alt").unwrap_or("").to_string() })
        })
        .collect()
}

/// Every `<table>` that has at least one row with cells.
pub fn extract_tables(root: &Node) -> Vec<TableRecord> {
    root.walk()
        .filter(|node| node.tag == "table")
        .filter_map(|table| {
            let data: Vec<Vec<String>> = table
                .find_all("tr")
                .map(|tr| {
                    tr.descendants()
                        .filter(|cell| matches!(cell.tag.as_str(), "td" | "th"))
                        .map(|cell| cell.text().trim().to_string())
                        .collect::<Vec<_>>()
                })
                .filter(|cells| !cells.is_empty())
                .collect();

            let columns = data.first()?.len();
            Some(TableRecord { rows: data.len(), columns, data })
        })
        .collect()
}

//! Structural HTML to Markdown conversion.
//!
//! Block elements render their flattened text; inline markup nested inside a
//! paragraph is not preserved. Sibling outputs are joined with newlines and a
//! final [`clean_markdown`] pass collapses the blank lines this produces.
//!
//! Tables only get a `---` separator row when they have a `<thead>`. A first
//! `<tr>` of `<th>` cells without a `<thead>` renders as a plain data row.

use url::Url;

use super::dom::{Child, Node};
use super::links::resolve_reference;

/// Request-scoped rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub include_images: bool,
    pub include_tables: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self { include_images: true, include_tables: true }
    }
}

/// Render the children of `node` as cleaned Markdown.
pub fn render_markdown(node: &Node, base: Option<&Url>, options: &MarkdownOptions) -> String {
    let renderer = MarkdownRenderer { base, options };
    clean_markdown(&renderer.children(node))
}

struct MarkdownRenderer<'a> {
    base: Option<&'a Url>,
    options: &'a MarkdownOptions,
}

impl MarkdownRenderer<'_> {
    fn children(&self, node: &Node) -> String {
        let mut parts = Vec::new();

        for child in &node.children {
            match child {
                Child::Text(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        parts.push(text.to_string());
                    }
                }
                Child::Element(element) => {
                    let rendered = self.element(element);
                    if !rendered.is_empty() {
                        parts.push(rendered);
                    }
                }
                Child::Comment(_) => {}
            }
        }

        parts.join("\n")
    }

    fn element(&self, node: &Node) -> String {
        let tag = node.tag.as_str();
        let full_text = node.text();
        let text = full_text.trim();

        if text.is_empty() && !matches!(tag, "img" | "br" | "hr") {
            return String::new();
        }

        if let Some(level) = node.heading_level() {
            return format!("{} {text}\n", "#".repeat(usize::from(level)));
        }

        match tag {
            "p" => format!("{text}\n"),
            "a" => match node.attr("href").filter(|href| !href.is_empty()) {
                Some(href) => format!("[{text}]({})", resolve_reference(href, self.base)),
                None => text.to_string(),
            },
            "img" if self.options.include_images => match node.attr("src").filter(|src| !src.is_empty()) {
                Some(src) => format!("![{}]({})", node.attr("alt").unwrap_or(""), resolve_reference(src, self.base)),
                None => String::new(),
            },
            "ul" => render_list(node, "-"),
            "ol" => render_list(node, "1."),
            "li" => text.to_string(),
            "table" if self.options.include_tables => render_table(node),
            "pre" => format!("```\n{text}\n```\n"),
            "code" => format!("`{text}`"),
            "strong" | "b" => format!("**{text}**"),
            "em" | "i" => format!("*{text}*"),
            "blockquote" => {
                let quoted: Vec<String> = text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| format!("> {line}"))
                    .collect();
                format!("{}\n", quoted.join("\n"))
            }
            "hr" => "---\n".to_string(),
            "br" => "\n".to_string(),
            _ => self.children(node),
        }
    }
}

fn render_list(list: &Node, marker: &str) -> String {
    let items: Vec<String> = list
        .elements()
        .filter(|child| child.tag == "li")
        .map(|li| li.text().trim().to_string())
        .filter(|text| !text.is_empty())
        .map(|text| format!("{marker} {text}"))
        .collect();
    format!("{}\n", items.join("\n"))
}

fn render_table(table: &Node) -> String {
    let mut rows = Vec::new();
    let thead = table.find("thead");

    if let Some(header_row) = thead.and_then(|head| head.find("tr")) {
        let headers = cell_texts(header_row);
        if !headers.is_empty() {
            rows.push(pipe_row(&headers));
            rows.push(pipe_row(&vec!["---".to_string(); headers.len()]));
        }
    }

    let body = table.find("tbody").unwrap_or(table);
    for tr in body.find_all("tr") {
        if thead.is_some_and(|head| head.contains(tr)) {
            continue;
        }
        let cells = cell_texts(tr);
        if !cells.is_empty() {
            rows.push(pipe_row(&cells));
        }
    }

    format!("{}\n", rows.join("\n"))
}

fn cell_texts(row: &Node) -> Vec<String> {
    row.descendants()
        .filter(|node| matches!(node.tag.as_str(), "td" | "th"))
        .map(|cell| cell.text().trim().to_string())
        .collect()
}

fn pipe_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// Right-trim lines, collapse blank-line runs to one, drop leading and
/// trailing blank lines.
pub fn clean_markdown(markdown: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut prev_blank = false;

    for line in markdown.split('\n') {
        let line = line.trim_end();
        if !line.is_empty() {
            lines.push(line);
            prev_blank = false;
        } else if !prev_blank {
            lines.push("");
            prev_blank = true;
        }
    }

    let start = lines.iter().position(|line| !line.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|line| !line.is_empty()).map_or(start, |i| i + 1);

    lines[start..end].join("\n")
}

//! Flat document model used by section extraction.
//!
//! A recipe blob is reduced to the ordered sequence of its block-level
//! siblings. Only two kinds of block matter to extraction, paragraphs and
//! tables; everything else collapses into [`Node::Other`].

use serde::{Deserialize, Serialize};

use super::{html, markdown};

/// A table with an optional header row and ordered body rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Builds a header-less table from string slices.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            header: Vec::new(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One block-level node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Paragraph-level text (paragraphs, headings, loose text).
    Paragraph(String),
    Table(Table),
    Other,
}

/// Ordered list of sibling block nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Parses a raw blob as HTML or markdown.
    ///
    /// Blobs that look like HTML are read as HTML first; if that yields no
    /// table but the markdown reading does, the markdown reading is used.
    pub fn parse(raw: &str) -> Self {
        if !looks_like_html(raw) {
            return markdown::parse(raw);
        }
        let document = html::parse(raw);
        if document.has_tables() {
            return document;
        }
        let fallback = markdown::parse(raw);
        if fallback.has_tables() { fallback } else { document }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn has_tables(&self) -> bool {
        self.nodes.iter().any(|node| matches!(node, Node::Table(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn looks_like_html(raw: &str) -> bool {
    if raw.trim_start().starts_with('<') {
        return true;
    }
    let lower = raw.to_ascii_lowercase();
    ["<table", "<p>", "<p ", "<div", "<h1", "<h2", "<h3"]
        .iter()
        .any(|tag| lower.contains(tag))
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Lenient HTML reader built on quick-xml.
//!
//! Generated recipe markup is not guaranteed to be well-formed XML: void
//! elements are left open and end tags may be missing. The reader keeps its
//! own element stack, treats void elements as empty, and closes paragraphs,
//! cells and rows implicitly the way a browser would.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;

use super::document::{Document, Node, Table, normalize_whitespace};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Wrappers whose children are spliced into the parent's sibling list.
const CONTAINERS: &[&str] = &[
    "html", "body", "div", "section", "article", "main", "header", "footer",
];

const PARAGRAPHS: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6"];

const INLINE: &[&str] = &[
    "a", "b", "strong", "em", "i", "u", "span", "code", "small", "mark", "sub", "sup",
];

/// Elements whose content is not markup and is dropped before tokenizing.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Named entities outside the XML set that show up in recipe text.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("nbsp", " "),
    ("deg", "°"),
    ("frac12", "½"),
    ("frac14", "¼"),
    ("frac34", "¾"),
    ("times", "×"),
    ("ndash", "–"),
    ("mdash", "—"),
    ("hellip", "…"),
    ("lsquo", "‘"),
    ("rsquo", "’"),
    ("ldquo", "“"),
    ("rdquo", "”"),
];

enum Block {
    /// `<p>` or heading opened at `depth`.
    Paragraph { depth: usize, text: String },
    /// Top-level text and inline markup outside any paragraph element.
    Loose { depth: usize, text: String },
    Table { depth: usize, builder: TableBuilder },
    Other { depth: usize },
}

#[derive(Default)]
struct TableBuilder {
    table: Table,
    row: Option<Vec<String>>,
    row_all_header: bool,
    cell: Option<String>,
}

impl TableBuilder {
    fn start_row(&mut self) {
        self.finish_row();
        self.row = Some(Vec::new());
        self.row_all_header = true;
    }

    fn start_cell(&mut self, header: bool) {
        self.finish_cell();
        if self.row.is_none() {
            self.start_row();
        }
        if !header {
            self.row_all_header = false;
        }
        self.cell = Some(String::new());
    }

    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.cell.as_mut() {
            cell.push_str(text);
        }
    }

    fn finish_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            let row = self.row.get_or_insert_with(Vec::new);
            row.push(normalize_whitespace(&cell));
        }
    }

    fn finish_row(&mut self) {
        self.finish_cell();
        if let Some(row) = self.row.take() {
            if row.is_empty() {
                return;
            }
            if self.row_all_header && self.table.header.is_empty() && self.table.rows.is_empty() {
                self.table.header = row;
            } else {
                self.table.rows.push(row);
            }
        }
    }

    fn finish(mut self) -> Table {
        self.finish_row();
        self.table
    }
}

struct HtmlReader {
    nodes: Vec<Node>,
    stack: Vec<String>,
    block: Option<Block>,
}

impl HtmlReader {
    fn new() -> Self {
        Self {
            nodes: Vec::new(),
            stack: Vec::new(),
            block: None,
        }
    }

    fn close_block(&mut self) {
        let depth = match &self.block {
            Some(Block::Paragraph { depth, .. })
            | Some(Block::Loose { depth, .. })
            | Some(Block::Table { depth, .. })
            | Some(Block::Other { depth }) => *depth,
            None => return,
        };
        self.stack.truncate(depth);
        match self.block.take() {
            Some(Block::Paragraph { text, .. }) | Some(Block::Loose { text, .. }) => {
                let text = normalize_whitespace(&text);
                if !text.is_empty() {
                    self.nodes.push(Node::Paragraph(text));
                }
            }
            Some(Block::Table { builder, .. }) => self.nodes.push(Node::Table(builder.finish())),
            Some(Block::Other { .. }) => self.nodes.push(Node::Other),
            None => {}
        }
    }

    fn start(&mut self, name: String, is_void: bool) {
        // Nested elements inside an open block.
        match self.block.as_mut() {
            Some(Block::Table { builder, .. }) => {
                match name.as_str() {
                    "tr" => builder.start_row(),
                    "td" => builder.start_cell(false),
                    "th" => builder.start_cell(true),
                    "br" => builder.push_text(" "),
                    _ => {}
                }
                if !is_void {
                    self.stack.push(name);
                }
                return;
            }
            Some(Block::Paragraph { text, .. }) if stays_inline(&name) => {
                if name == "br" {
                    text.push(' ');
                }
                if !is_void {
                    self.stack.push(name);
                }
                return;
            }
            Some(Block::Other { .. }) => {
                if !is_void {
                    self.stack.push(name);
                }
                return;
            }
            Some(Block::Loose { text, .. }) if stays_inline(&name) => {
                if name == "br" {
                    text.push(' ');
                }
                if !is_void {
                    self.stack.push(name);
                }
                return;
            }
            _ => {}
        }

        // A new top-level sibling begins.
        self.close_block();
        let depth = self.stack.len();
        let tag = name.as_str();
        if CONTAINERS.contains(&tag) {
            if !is_void {
                self.stack.push(name);
            }
            return;
        }
        if INLINE.contains(&tag) {
            self.block = Some(Block::Loose {
                depth,
                text: String::new(),
            });
            self.stack.push(name);
            return;
        }
        if is_void {
            if tag != "br" {
                self.nodes.push(Node::Other);
            }
            return;
        }
        self.block = Some(if PARAGRAPHS.contains(&tag) {
            Block::Paragraph {
                depth,
                text: String::new(),
            }
        } else if tag == "table" {
            Block::Table {
                depth,
                builder: TableBuilder::default(),
            }
        } else {
            Block::Other { depth }
        });
        self.stack.push(name);
    }

    fn end(&mut self, name: &str) {
        let Some(position) = self.stack.iter().rposition(|open| open == name) else {
            return;
        };
        self.stack.truncate(position);

        if let Some(Block::Table { builder, .. }) = self.block.as_mut() {
            match name {
                "td" | "th" => builder.finish_cell(),
                "tr" => builder.finish_row(),
                _ => {}
            }
        }

        let closes_block = match &self.block {
            Some(Block::Paragraph { depth, .. })
            | Some(Block::Table { depth, .. })
            | Some(Block::Other { depth }) => self.stack.len() <= *depth,
            Some(Block::Loose { depth, .. }) => self.stack.len() < *depth,
            None => false,
        };
        if closes_block {
            self.close_block();
        }
    }

    fn text(&mut self, text: &str) {
        match self.block.as_mut() {
            Some(Block::Paragraph { text: buffer, .. })
            | Some(Block::Loose { text: buffer, .. }) => {
                buffer.push_str(text);
            }
            Some(Block::Table { builder, .. }) => builder.push_text(text),
            Some(Block::Other { .. }) => {}
            None => {
                if !text.trim().is_empty() {
                    self.block = Some(Block::Loose {
                        depth: self.stack.len(),
                        text: text.to_string(),
                    });
                }
            }
        }
    }

    fn finish(mut self) -> Document {
        self.close_block();
        Document::from_nodes(self.nodes)
    }
}

fn stays_inline(name: &str) -> bool {
    INLINE.contains(&name) || name == "br" || name == "img"
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

/// Decodes a text run, resolving any references the tokenizer left inline.
fn decode_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut out = String::with_capacity(text.len());
    let mut rest: &str = &text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';') {
            Some(end) if starts_reference(after.as_bytes()) => {
                out.push_str(&resolve_reference(&after[..end]));
                rest = &after[end + 1..];
            }
            _ => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn resolve_reference(name: &str) -> Cow<'static, str> {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        if let Some(ch) = parsed.and_then(char::from_u32) {
            return Cow::Owned(ch.to_string());
        }
    } else if let Some(resolved) = resolve_predefined_entity(name) {
        return Cow::Borrowed(resolved);
    } else if let Some((_, resolved)) = HTML_ENTITIES.iter().find(|(entity, _)| *entity == name) {
        return Cow::Borrowed(*resolved);
    }
    Cow::Owned(format!("&{name};"))
}

/// Finds the next `<tag` opening at or after `from` in lowercased source.
fn find_tag_open(lower: &str, from: usize, tag: &str) -> Option<usize> {
    let pattern = format!("<{tag}");
    let mut cursor = from;
    while let Some(offset) = lower[cursor..].find(&pattern) {
        let at = cursor + offset;
        let after = lower.as_bytes().get(at + pattern.len()).copied();
        let at_boundary = match after {
            None | Some(b'>' | b'/') => true,
            Some(b) => b.is_ascii_whitespace(),
        };
        if at_boundary {
            return Some(at);
        }
        cursor = at + pattern.len();
    }
    None
}

/// Removes `<script>` and `<style>` elements together with their content.
fn strip_raw_text_elements(source: &str) -> Cow<'_, str> {
    let lower = source.to_ascii_lowercase();
    let next_open = |from: usize| {
        RAW_TEXT_ELEMENTS
            .iter()
            .filter_map(|tag| find_tag_open(&lower, from, tag).map(|at| (at, *tag)))
            .min_by_key(|(at, _)| *at)
    };
    let Some(mut open) = next_open(0) else {
        return Cow::Borrowed(source);
    };

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0;
    loop {
        let (start, tag) = open;
        out.push_str(&source[cursor..start]);
        let close = format!("</{tag}");
        cursor = match lower[start..].find(&close) {
            Some(offset) => {
                let close_at = start + offset;
                lower[close_at..]
                    .find('>')
                    .map_or(source.len(), |gt| close_at + gt + 1)
            }
            None => source.len(),
        };
        match next_open(cursor) {
            Some(next) => open = next,
            None => break,
        }
    }
    out.push_str(&source[cursor..]);
    Cow::Owned(out)
}

/// Whether the bytes after `&` form a character or entity reference.
fn starts_reference(rest: &[u8]) -> bool {
    let Some(end) = rest.iter().take(32).position(|&b| b == b';') else {
        return false;
    };
    match &rest[..end] {
        [b'#', b'x' | b'X', hex @ ..] => !hex.is_empty() && hex.iter().all(u8::is_ascii_hexdigit),
        [b'#', digits @ ..] => !digits.is_empty() && digits.iter().all(u8::is_ascii_digit),
        [first, tail @ ..] => {
            first.is_ascii_alphabetic() && tail.iter().all(u8::is_ascii_alphanumeric)
        }
        [] => false,
    }
}

/// Whether the byte after `<` can begin a tag, end tag, comment or declaration.
fn starts_markup(next: Option<u8>) -> bool {
    next.is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
}

/// Escapes `&` and `<` that do not begin a reference or markup, which HTML
/// tolerates in text but the XML tokenizer rejects.
fn escape_stray_markup(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for (index, &byte) in bytes.iter().enumerate() {
        let replacement = match byte {
            b'&' if !starts_reference(&bytes[index + 1..]) => "&amp;",
            b'<' if !starts_markup(bytes.get(index + 1).copied()) => "&lt;",
            _ => continue,
        };
        out.push_str(&source[last..index]);
        out.push_str(replacement);
        last = index + 1;
    }
    out.push_str(&source[last..]);
    out
}

/// Parses an HTML fragment into its block-level sibling nodes.
///
/// Never fails: on a syntax error the nodes read so far are kept.
pub fn parse(raw: &str) -> Document {
    let source = escape_stray_markup(&strip_raw_text_elements(raw));
    let mut reader = Reader::from_str(&source);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut html = HtmlReader::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = tag_name(start.local_name().as_ref());
                let is_void = VOID_ELEMENTS.contains(&name.as_str());
                html.start(name, is_void);
            }
            Ok(Event::Empty(start)) => {
                let name = tag_name(start.local_name().as_ref());
                html.start(name, true);
            }
            Ok(Event::End(end)) => {
                let name = tag_name(end.local_name().as_ref());
                html.end(&name);
            }
            Ok(Event::Text(text)) => html.text(&decode_text(&text)),
            Ok(Event::CData(data)) => html.text(&String::from_utf8_lossy(&data)),
            Ok(Event::GeneralRef(reference)) => {
                let name = String::from_utf8_lossy(&reference).into_owned();
                html.text(&resolve_reference(&name));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    "[Extractor] HTML parse stopped at byte {}: {}",
                    reader.buffer_position(),
                    err
                );
                break;
            }
        }
    }
    html.finish()
}

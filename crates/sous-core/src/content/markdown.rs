//! Markdown reader for recipe content.
//!
//! Uses pulldown-cmark with GFM tables enabled.

use pulldown_cmark::{Event, Options, Parser as MdParser, Tag, TagEnd};

use super::document::{Document, Node, Table, normalize_whitespace};

/// Inserts a blank line between a caption line and a table that follows it
/// directly, so the caption is read as its own paragraph.
fn separate_tables(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 16);
    let mut previous: Option<&str> = None;
    for line in raw.lines() {
        let is_row = line.trim_start().starts_with('|');
        if let Some(prev) = previous {
            let prev_is_row = prev.trim_start().starts_with('|');
            if is_row && !prev_is_row && !prev.trim().is_empty() {
                out.push('\n');
            }
        }
        out.push_str(line);
        out.push('\n');
        previous = Some(line);
    }
    out
}

enum Block {
    Paragraph(String),
    Table {
        table: Table,
        row: Vec<String>,
        cell: Option<String>,
        in_head: bool,
    },
    Other,
}

/// Parses markdown into its top-level block nodes.
pub fn parse(raw: &str) -> Document {
    let source = separate_tables(raw);
    let parser = MdParser::new_ext(&source, Options::ENABLE_TABLES);

    let mut nodes = Vec::new();
    let mut depth = 0usize;
    let mut block: Option<Block> = None;

    for event in parser {
        match event {
            Event::Start(tag) => {
                if depth == 0 {
                    block = Some(match tag {
                        Tag::Paragraph | Tag::Heading { .. } => Block::Paragraph(String::new()),
                        Tag::Table(_) => Block::Table {
                            table: Table::default(),
                            row: Vec::new(),
                            cell: None,
                            in_head: false,
                        },
                        _ => Block::Other,
                    });
                } else if let Some(Block::Table {
                    row, cell, in_head, ..
                }) = block.as_mut()
                {
                    match tag {
                        Tag::TableHead => {
                            *in_head = true;
                            row.clear();
                        }
                        Tag::TableRow => row.clear(),
                        Tag::TableCell => *cell = Some(String::new()),
                        _ => {}
                    }
                }
                depth += 1;
            }
            Event::End(tag_end) => {
                depth = depth.saturating_sub(1);
                if let Some(Block::Table {
                    table,
                    row,
                    cell,
                    in_head,
                }) = block.as_mut()
                {
                    match tag_end {
                        TagEnd::TableCell => {
                            if let Some(text) = cell.take() {
                                row.push(normalize_whitespace(&text));
                            }
                        }
                        TagEnd::TableHead => {
                            table.header = std::mem::take(row);
                            *in_head = false;
                        }
                        TagEnd::TableRow if !*in_head => {
                            table.rows.push(std::mem::take(row));
                        }
                        _ => {}
                    }
                }
                if depth == 0 {
                    match block.take() {
                        Some(Block::Paragraph(text)) => {
                            let text = normalize_whitespace(&text);
                            if !text.is_empty() {
                                nodes.push(Node::Paragraph(text));
                            }
                        }
                        Some(Block::Table { table, .. }) => nodes.push(Node::Table(table)),
                        Some(Block::Other) => nodes.push(Node::Other),
                        None => {}
                    }
                }
            }
            Event::Text(text) | Event::Code(text) | Event::InlineHtml(text) => {
                match block.as_mut() {
                    Some(Block::Paragraph(buffer)) => buffer.push_str(&text),
                    Some(Block::Table {
                        cell: Some(cell), ..
                    }) => cell.push_str(&text),
                    _ => {}
                }
            }
            Event::SoftBreak | Event::HardBreak => match block.as_mut() {
                Some(Block::Paragraph(buffer)) => buffer.push(' '),
                Some(Block::Table {
                    cell: Some(cell), ..
                }) => cell.push(' '),
                _ => {}
            },
            Event::Rule | Event::Html(_) if depth == 0 => nodes.push(Node::Other),
            _ => {}
        }
    }

    Document::from_nodes(nodes)
}

//! Structured content extraction.
//!
//! Recipe detail payloads arrive as loosely formatted markup. This module
//! reduces them to a flat [`Document`] of block nodes and pulls the three
//! named tables out of it.
//!
//! # Module Structure
//!
//! - `document`: block node model (`Document`, `Node`, `Table`)
//! - `html`: lenient HTML reader (quick-xml)
//! - `markdown`: markdown reader (pulldown-cmark)
//! - `extractor`: caption-matching section extraction

mod document;
mod extractor;
pub mod html;
pub mod markdown;

pub use document::{Document, Node, Table};
pub use extractor::{ParsedRecipeSections, Section, StructuredContentExtractor};

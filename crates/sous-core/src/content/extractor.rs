use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use super::document::{Document, Node, Table};

/// The three named recipe sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum Section {
    Ingredients,
    Instructions,
    Nutrition,
}

impl Section {
    /// Caption text that introduces the section's table.
    pub fn label(self) -> &'static str {
        match self {
            Section::Ingredients => "Quantified Ingredients",
            Section::Instructions => "Instructions",
            Section::Nutrition => "Nutrition count",
        }
    }

    /// Case-insensitive substring match against the caption label.
    pub fn matches(self, text: &str) -> bool {
        text.to_lowercase().contains(&self.label().to_lowercase())
    }

    /// Text shown in place of a section that could not be located.
    pub fn placeholder(self) -> String {
        format!("Could not find the \"{}\" table in this recipe.", self.label())
    }
}

/// Tables extracted from one recipe detail. Any section may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecipeSections {
    pub ingredients: Option<Table>,
    pub instructions: Option<Table>,
    pub nutrition: Option<Table>,
}

impl ParsedRecipeSections {
    pub fn get(&self, section: Section) -> Option<&Table> {
        match section {
            Section::Ingredients => self.ingredients.as_ref(),
            Section::Instructions => self.instructions.as_ref(),
            Section::Nutrition => self.nutrition.as_ref(),
        }
    }

    fn slot(&mut self, section: Section) -> &mut Option<Table> {
        match section {
            Section::Ingredients => &mut self.ingredients,
            Section::Instructions => &mut self.instructions,
            Section::Nutrition => &mut self.nutrition,
        }
    }

    /// Sections that could not be located, in display order.
    pub fn missing(&self) -> Vec<Section> {
        Section::iter().filter(|s| self.get(*s).is_none()).collect()
    }
}

/// Locates the ingredient, instruction and nutrition tables in a recipe blob.
///
/// A paragraph whose text contains a section label (case-insensitive) claims
/// the table that is its immediately following sibling. When several
/// paragraphs match the same label, the last one followed by a table wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuredContentExtractor;

impl StructuredContentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Parses `raw` (HTML or markdown) and extracts its sections.
    pub fn extract(&self, raw: &str) -> ParsedRecipeSections {
        self.extract_document(&Document::parse(raw))
    }

    pub fn extract_document(&self, document: &Document) -> ParsedRecipeSections {
        let mut sections = ParsedRecipeSections::default();
        let nodes = document.nodes();

        for (index, node) in nodes.iter().enumerate() {
            let Node::Paragraph(text) = node else {
                continue;
            };
            let Some(Node::Table(table)) = nodes.get(index + 1) else {
                continue;
            };
            for section in Section::iter().filter(|s| s.matches(text)) {
                *sections.slot(section) = Some(table.clone());
            }
        }

        for section in sections.missing() {
            tracing::debug!("[Extractor] Section not found: {}", section.label());
        }
        sections
    }
}

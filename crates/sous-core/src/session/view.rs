//! View types for session state management.

use serde::{Deserialize, Serialize};
use strum::Display;

/// The primary view of the session.
///
/// The workflow moves `Requesting → Selecting → Detail → Cooking` and back.
/// There is no terminal view; a reset returns to `Requesting`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum View {
    /// Collecting the meal request.
    #[default]
    Requesting,
    /// Choosing among the generated recipe options.
    Selecting,
    /// Showing one recipe's structured detail.
    Detail,
    /// Walking through the recipe step by step.
    Cooking,
}

impl View {
    /// Whether assistant overlays may be opened from this view.
    pub fn allows_overlays(self) -> bool {
        matches!(self, View::Detail | View::Cooking)
    }
}

/// A transient modal shown over `Detail` or `Cooking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Overlay {
    /// Single-shot explanation of one instruction.
    Explain,
    /// Multi-turn recipe chat.
    Chat,
}

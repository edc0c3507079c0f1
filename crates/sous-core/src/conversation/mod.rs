//! Assistant conversations anchored to a recipe.
//!
//! - `message`: transcript message types (`MessageRole`, `ConversationMessage`)
//! - `context`: per-modal conversation state (`ConversationContext`)

mod context;
mod message;

pub use context::{ConversationContext, ConversationMode, DisplayEntry};
pub use message::{ConversationMessage, MessageRole};

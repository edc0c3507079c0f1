//! Domain core for Sous Chef.
//!
//! Holds the recipe workflow's data model, the structured content extractor,
//! the cooking step sequencer, assistant conversation state, the diagnostic
//! agent log, and the backend contract the session drives.

pub mod agent_log;
pub mod backend;
pub mod config;
pub mod content;
pub mod conversation;
pub mod cooking;
pub mod error;
pub mod meal;
pub mod recipe;
pub mod session;

// Re-export common error type
pub use error::SousError;

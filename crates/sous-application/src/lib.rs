//! Application layer for Sous Chef.
//!
//! This crate provides the session state machine that sequences backend calls
//! in response to user actions and owns all session-scoped state.

pub mod session;

pub use session::{
    ChatRequest, Completion, DetailRequest, ExplainRequest, OptionsRequest, ProfileDataRequest,
    RecipeSelection, SessionStateMachine,
};

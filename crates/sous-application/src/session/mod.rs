//! Session orchestration.
//!
//! - `machine`: `SessionStateMachine` state, accessors and view transitions
//! - `requests`: ticketed begin/complete pairs for each backend operation
//! - `driver`: async helpers that run a begin/call/complete cycle against a backend

mod driver;
mod machine;
mod requests;

pub use machine::{RecipeSelection, SessionStateMachine};
pub use requests::{
    ChatRequest, Completion, DetailRequest, ExplainRequest, OptionsRequest, ProfileDataRequest,
};

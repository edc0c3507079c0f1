//! Cooking mode: step sequencing and navigation.

mod sequencer;

pub use sequencer::{CookingSession, CookingStep, CookingStepSequencer};

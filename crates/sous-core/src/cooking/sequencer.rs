use serde::{Deserialize, Serialize};

use crate::content::Table;
use crate::error::{Result, SousError};

/// One instruction step.
///
/// `number` is the label the backend assigned to the row. It is not assumed
/// to be numeric or contiguous; navigation order is the row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookingStep {
    pub number: String,
    pub instruction: String,
}

impl CookingStep {
    pub fn new(number: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            instruction: instruction.into(),
        }
    }
}

/// Builds cooking sessions from an instructions table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookingStepSequencer;

impl CookingStepSequencer {
    /// Converts table rows into steps. Rows with fewer than two cells are
    /// skipped.
    pub fn steps_from_table(table: &Table) -> Vec<CookingStep> {
        table
            .rows
            .iter()
            .filter_map(|row| match row.as_slice() {
                [number, instruction, ..] => {
                    Some(CookingStep::new(number.trim(), instruction.trim()))
                }
                _ => None,
            })
            .collect()
    }

    /// Builds a session positioned on the first step.
    ///
    /// # Errors
    ///
    /// Returns [`SousError::Sequencing`] when the table is missing or yields
    /// no steps.
    pub fn build(table: Option<&Table>) -> Result<CookingSession> {
        let table = table.ok_or_else(|| {
            SousError::sequencing("Cannot start cooking mode: this recipe has no instructions table.")
        })?;
        CookingSession::new(Self::steps_from_table(table))
    }
}

/// Ordered steps plus the current position. The index is clamped to the
/// step range and never wraps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CookingSession {
    steps: Vec<CookingStep>,
    current_index: usize,
}

impl CookingSession {
    /// # Errors
    ///
    /// Returns [`SousError::Sequencing`] when `steps` is empty.
    pub fn new(steps: Vec<CookingStep>) -> Result<Self> {
        if steps.is_empty() {
            return Err(SousError::sequencing(
                "Cannot start cooking mode: the instructions table has no usable steps.",
            ));
        }
        Ok(Self {
            steps,
            current_index: 0,
        })
    }

    pub fn current(&self) -> &CookingStep {
        &self.steps[self.current_index]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn steps(&self) -> &[CookingStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_first(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 == self.steps.len()
    }

    /// Moves to the next step. Returns `false` (and stays put) on the last step.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Moves to the previous step. Returns `false` (and stays put) on the first step.
    pub fn retreat(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current_index -= 1;
        true
    }
}

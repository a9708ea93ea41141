//! Persisted plan state.

use serde::{Deserialize, Serialize};

use super::step::PlanStep;

/// The active plan and its execution cursor, as persisted between sessions.
///
/// The cursor is the offset of the next step to run; it always satisfies
/// `cursor <= steps.len()`. The serialized field names match the record
/// format the editor extension originally wrote, so existing state remains
/// readable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanState {
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default, rename = "currentIndex")]
    pub cursor: usize,
}

impl PlanState {
    /// Clamp the cursor into the valid range after loading external data.
    pub fn normalize(&mut self) {
        if self.cursor > self.steps.len() {
            self.cursor = self.steps.len();
        }
    }

    /// Coarse progress phase of the plan.
    pub fn phase(&self) -> PlanPhase {
        if self.steps.is_empty() {
            PlanPhase::NoPlan
        } else if self.cursor >= self.steps.len() {
            PlanPhase::Complete
        } else {
            PlanPhase::InProgress
        }
    }
}

/// Coarse progress phase derived from the plan state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanPhase {
    /// No plan has been built
    NoPlan,
    /// The cursor points at a runnable step
    InProgress,
    /// Every step has been visited
    Complete,
}

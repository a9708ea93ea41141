//! Plan step model.

use serde::{Deserialize, Serialize};

use super::status::StepStatus;

/// A single step of an execution plan.
///
/// Steps are produced by the plan parser from model output and are always
/// stored fully populated: missing fields are filled with defaults at parse
/// time rather than carried as options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    /// 1-based display ordinal
    pub index: u32,
    /// Short human-readable title
    pub title: String,
    /// What the step is trying to achieve
    pub intent: String,
    /// Advisory hint that the step may mutate files or state. Display
    /// metadata only; gating decisions key off the concrete operation type.
    pub side_effects: bool,
    /// The instruction handed to the executor
    pub instruction: String,
    #[serde(default)]
    pub status: StepStatus,
}

impl PlanStep {
    /// Create a pending step with the given ordinal and content.
    pub fn new(
        index: u32,
        title: impl Into<String>,
        intent: impl Into<String>,
        side_effects: bool,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            index,
            title: title.into(),
            intent: intent.into(),
            side_effects,
            instruction: instruction.into(),
            status: StepStatus::Pending,
        }
    }
}

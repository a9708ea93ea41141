//! Parameter structures shared across interfaces.
//!
//! These are the core parameter types the CLI and the MCP server both
//! convert into. Framework-specific derives stay in the interface layers
//! (clap `Args` wrappers in the CLI); JSON schema generation is gated
//! behind the `schema` feature so the core stays light for library users.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for building a plan from a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct BuildPlan {
    /// The natural-language request to break into steps
    pub prompt: String,
}

/// Parameters addressing one plan step by its 1-based number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct StepRef {
    /// 1-based step number as shown in the plan overview
    pub index: usize,
}

impl StepRef {
    /// Convert to the 0-based offset the manager works with.
    /// Returns `None` for index 0, which no step carries.
    pub fn offset(&self) -> Option<usize> {
        self.index.checked_sub(1)
    }
}

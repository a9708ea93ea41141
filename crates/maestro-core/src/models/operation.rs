//! Side-effecting operation descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The concrete kind of a side-effecting operation.
///
/// Gating decisions key off this type, never off a plan step's advisory
/// `side_effects` flag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Append or insert content into an existing file
    Insert,
    /// Replace the content of an existing file
    Replace,
    /// Create a new file
    Create,
    /// Delete an existing file
    Delete,
    /// Move or rename a file
    Move,
}

impl OperationType {
    /// Convert to the display string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Insert => "insert",
            OperationType::Replace => "replace",
            OperationType::Create => "create",
            OperationType::Delete => "delete",
            OperationType::Move => "move",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of a pending side-effecting operation, shown to the user
/// before it is applied. Ephemeral: built for a confirmation round-trip and
/// never persisted.
#[derive(Debug, Clone)]
pub struct SideEffectOperation {
    pub kind: OperationType,
    /// Affected file or resource, for display
    pub target: String,
    /// Optional content preview shown on request
    pub preview: Option<String>,
}

impl SideEffectOperation {
    pub fn new(kind: OperationType, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            preview: None,
        }
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }
}

impl fmt::Display for SideEffectOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.target)
    }
}

//! Confirmation gate for side-effecting operations.
//!
//! Every mutating operation passes through the gate before it runs. The
//! gate asks the user to review the operation; the user may apply it,
//! request a preview first, or cancel. Declining is a normal outcome, not
//! an error: the caller receives `Ok(None)` and nothing has happened.

use crate::error::Result;
use crate::models::SideEffectOperation;

/// The user's answer at the initial review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    /// Apply the operation
    Apply,
    /// Show the preview, then ask again
    Preview,
    /// Decline the operation
    Cancel,
}

/// UI seam for the confirmation dialog. The CLI implements this over stdin;
/// tests script it.
pub trait Confirmer {
    /// Present the operation for review.
    fn review(&mut self, operation: &SideEffectOperation) -> Review;

    /// Present the preview content and ask for the final decision.
    /// `preview` is `None` when the operation has no preview to show.
    fn confirm_after_preview(
        &mut self,
        operation: &SideEffectOperation,
        preview: Option<&str>,
    ) -> bool;
}

/// Gate that routes every side-effecting operation through a confirmation
/// round-trip.
pub struct SideEffectGate<C: Confirmer> {
    confirmer: C,
}

impl<C: Confirmer> SideEffectGate<C> {
    pub fn new(confirmer: C) -> Self {
        Self { confirmer }
    }

    /// Ask the user about `operation` and, if approved, run `apply` exactly
    /// once. Returns `Ok(None)` when the user declines at any point;
    /// `apply`'s own failure propagates unchanged.
    pub fn confirm_and_apply<T>(
        &mut self,
        operation: &SideEffectOperation,
        apply: impl FnOnce() -> Result<T>,
    ) -> Result<Option<T>> {
        let approved = match self.confirmer.review(operation) {
            Review::Apply => true,
            Review::Cancel => false,
            Review::Preview => self
                .confirmer
                .confirm_after_preview(operation, operation.preview.as_deref()),
        };
        if !approved {
            return Ok(None);
        }
        apply().map(Some)
    }
}

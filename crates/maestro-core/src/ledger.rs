//! In-memory undo ledger.
//!
//! Each applied side-effecting operation records an inverse action. Undo is
//! strictly last-in-first-out and single-shot: an entry is popped before its
//! inverse runs, so a failing inverse is consumed rather than retried. The
//! ledger lives for the process only; nothing here is persisted.

use log::info;

use crate::error::Result;

/// An applied operation's inverse.
pub struct UndoEntry {
    description: String,
    inverse: Box<dyn FnOnce() -> Result<()> + Send>,
}

impl UndoEntry {
    pub fn new(
        description: impl Into<String>,
        inverse: impl FnOnce() -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            inverse: Box::new(inverse),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Stack of undoable operations.
#[derive(Default)]
pub struct UndoLedger {
    entries: Vec<UndoEntry>,
}

impl UndoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the inverse of an operation that just succeeded.
    pub fn record(&mut self, entry: UndoEntry) {
        info!("undo available: {}", entry.description());
        self.entries.push(entry);
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undo the most recent operation. Returns the undone entry's
    /// description, or `None` when there is nothing to undo. The entry is
    /// popped before its inverse runs; if the inverse fails, the error
    /// propagates and the entry is gone.
    pub fn undo_last(&mut self) -> Result<Option<String>> {
        let Some(entry) = self.entries.pop() else {
            return Ok(None);
        };
        (entry.inverse)()?;
        Ok(Some(entry.description))
    }
}

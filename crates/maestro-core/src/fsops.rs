//! Gated, undoable file mutations.
//!
//! `FileMutator` bundles the side-effect gate with the undo ledger: every
//! primitive asks for confirmation keyed by its concrete operation type,
//! applies the mutation only on approval, and records an inverse action
//! built from an in-memory backup of the prior state. A declined operation
//! returns `Ok(None)` and leaves both the filesystem and the ledger
//! untouched.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FsResultExt, MaestroError, Result};
use crate::gate::{Confirmer, SideEffectGate};
use crate::ledger::{UndoEntry, UndoLedger};
use crate::models::{OperationType, SideEffectOperation};

/// File mutation frontend: gate in front, ledger behind.
pub struct FileMutator<C: Confirmer> {
    gate: SideEffectGate<C>,
    ledger: UndoLedger,
}

impl<C: Confirmer> FileMutator<C> {
    pub fn new(confirmer: C) -> Self {
        Self {
            gate: SideEffectGate::new(confirmer),
            ledger: UndoLedger::new(),
        }
    }

    pub fn ledger(&self) -> &UndoLedger {
        &self.ledger
    }

    /// Undo the most recent applied mutation, returning its description.
    pub fn undo_last(&mut self) -> Result<Option<String>> {
        self.ledger.undo_last()
    }

    /// Create a new file with the given content. Fails if the file already
    /// exists. Undo removes the file.
    pub fn create_file(&mut self, path: &Path, content: &str) -> Result<Option<()>> {
        if path.exists() {
            return Err(MaestroError::invalid_input(
                "path",
                format!("{} already exists", path.display()),
            ));
        }
        let operation = SideEffectOperation::new(OperationType::Create, path.display().to_string())
            .with_preview(content);

        let target = path.to_path_buf();
        let content = content.to_string();
        let applied = self.gate.confirm_and_apply(&operation, || {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).fs_context(parent)?;
            }
            fs::write(&target, &content).fs_context(&target)?;
            Ok(target.clone())
        })?;

        Ok(self.record_applied(applied, |target| {
            let undo_target = target.to_path_buf();
            UndoEntry::new(format!("create {}", target.display()), move || {
                fs::remove_file(&undo_target).fs_context(&undo_target)
            })
        }))
    }

    /// Replace an existing file's content. Undo restores the prior content.
    pub fn replace_file(&mut self, path: &Path, content: &str) -> Result<Option<()>> {
        let backup = fs::read(path).fs_context(path)?;
        let operation =
            SideEffectOperation::new(OperationType::Replace, path.display().to_string())
                .with_preview(content);

        let target = path.to_path_buf();
        let content = content.to_string();
        let applied = self.gate.confirm_and_apply(&operation, || {
            fs::write(&target, &content).fs_context(&target)?;
            Ok(target.clone())
        })?;

        Ok(self.record_applied(applied, |target| {
            restore_entry("replace", target, backup)
        }))
    }

    /// Append content to an existing file. Undo restores the prior content.
    pub fn append_to_file(&mut self, path: &Path, content: &str) -> Result<Option<()>> {
        let backup = fs::read(path).fs_context(path)?;
        let operation = SideEffectOperation::new(OperationType::Insert, path.display().to_string())
            .with_preview(content);

        let target = path.to_path_buf();
        let mut appended = backup.clone();
        appended.extend_from_slice(content.as_bytes());
        let applied = self.gate.confirm_and_apply(&operation, || {
            fs::write(&target, &appended).fs_context(&target)?;
            Ok(target.clone())
        })?;

        Ok(self.record_applied(applied, |target| {
            restore_entry("append to", target, backup)
        }))
    }

    /// Delete a file, backing up its content first. Undo writes the backup
    /// back.
    pub fn delete_file(&mut self, path: &Path) -> Result<Option<()>> {
        let backup = fs::read(path).fs_context(path)?;
        let operation = SideEffectOperation::new(OperationType::Delete, path.display().to_string())
            .with_preview(String::from_utf8_lossy(&backup).into_owned());

        let target = path.to_path_buf();
        let applied = self.gate.confirm_and_apply(&operation, || {
            fs::remove_file(&target).fs_context(&target)?;
            Ok(target.clone())
        })?;

        Ok(self.record_applied(applied, |target| {
            let undo_target = target.to_path_buf();
            UndoEntry::new(format!("delete {}", target.display()), move || {
                if let Some(parent) = undo_target.parent() {
                    fs::create_dir_all(parent).fs_context(parent)?;
                }
                fs::write(&undo_target, &backup).fs_context(&undo_target)
            })
        }))
    }

    /// Move or rename a file. Fails if the destination exists. Undo renames
    /// it back.
    pub fn move_file(&mut self, from: &Path, to: &Path) -> Result<Option<()>> {
        if !from.exists() {
            return Err(MaestroError::FileSystem {
                path: from.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "source not found"),
            });
        }
        if to.exists() {
            return Err(MaestroError::invalid_input(
                "to",
                format!("{} already exists", to.display()),
            ));
        }
        let operation = SideEffectOperation::new(
            OperationType::Move,
            format!("{} -> {}", from.display(), to.display()),
        );

        let source = from.to_path_buf();
        let dest = to.to_path_buf();
        let applied = self.gate.confirm_and_apply(&operation, || {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).fs_context(parent)?;
            }
            fs::rename(&source, &dest).fs_context(&source)?;
            Ok((source.clone(), dest.clone()))
        })?;

        if let Some((source, dest)) = &applied {
            let undo_from = dest.clone();
            let undo_to = source.clone();
            self.ledger.record(UndoEntry::new(
                format!("move {} -> {}", source.display(), dest.display()),
                move || fs::rename(&undo_from, &undo_to).fs_context(&undo_from),
            ));
        }
        Ok(applied.map(|_| ()))
    }

    fn record_applied(
        &mut self,
        applied: Option<PathBuf>,
        make_entry: impl FnOnce(&Path) -> UndoEntry,
    ) -> Option<()> {
        applied.map(|target| {
            self.ledger.record(make_entry(&target));
        })
    }
}

/// Undo entry that restores a file's previous bytes.
fn restore_entry(verb: &str, target: &Path, backup: Vec<u8>) -> UndoEntry {
    let undo_target = target.to_path_buf();
    UndoEntry::new(format!("{verb} {}", target.display()), move || {
        fs::write(&undo_target, &backup).fs_context(&undo_target)
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::gate::Review;

    /// Confirmer that approves everything immediately.
    struct Approve;

    impl Confirmer for Approve {
        fn review(&mut self, _operation: &SideEffectOperation) -> Review {
            Review::Apply
        }

        fn confirm_after_preview(
            &mut self,
            _operation: &SideEffectOperation,
            _preview: Option<&str>,
        ) -> bool {
            true
        }
    }

    /// Confirmer that declines everything.
    struct Decline;

    impl Confirmer for Decline {
        fn review(&mut self, _operation: &SideEffectOperation) -> Review {
            Review::Cancel
        }

        fn confirm_after_preview(
            &mut self,
            _operation: &SideEffectOperation,
            _preview: Option<&str>,
        ) -> bool {
            false
        }
    }

    #[test]
    fn create_then_undo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.txt");
        let mut mutator = FileMutator::new(Approve);

        assert_eq!(mutator.create_file(&path, "hello").unwrap(), Some(()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");

        let undone = mutator.undo_last().unwrap();
        assert!(undone.unwrap().contains("create"));
        assert!(!path.exists());
    }

    #[test]
    fn create_refuses_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "old").unwrap();
        let mut mutator = FileMutator::new(Approve);
        assert!(matches!(
            mutator.create_file(&path, "new"),
            Err(MaestroError::InvalidInput { .. })
        ));
    }

    #[test]
    fn delete_then_undo_restores_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doomed.txt");
        fs::write(&path, "precious").unwrap();
        let mut mutator = FileMutator::new(Approve);

        assert_eq!(mutator.delete_file(&path).unwrap(), Some(()));
        assert!(!path.exists());

        mutator.undo_last().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "precious");
    }

    #[test]
    fn replace_then_undo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.txt");
        fs::write(&path, "v1").unwrap();
        let mut mutator = FileMutator::new(Approve);

        mutator.replace_file(&path, "v2").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v2");

        mutator.undo_last().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "v1");
    }

    #[test]
    fn append_then_undo() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        fs::write(&path, "line1\n").unwrap();
        let mut mutator = FileMutator::new(Approve);

        mutator.append_to_file(&path, "line2\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "line1\nline2\n");

        mutator.undo_last().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "line1\n");
    }

    #[test]
    fn move_then_undo() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("old.txt");
        let to = dir.path().join("sub").join("new.txt");
        fs::write(&from, "content").unwrap();
        let mut mutator = FileMutator::new(Approve);

        mutator.move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "content");

        mutator.undo_last().unwrap();
        assert!(from.exists());
        assert!(!to.exists());
    }

    #[test]
    fn declined_operations_change_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kept.txt");
        fs::write(&path, "original").unwrap();
        let mut mutator = FileMutator::new(Decline);

        assert_eq!(mutator.delete_file(&path).unwrap(), None);
        assert_eq!(mutator.replace_file(&path, "x").unwrap(), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(mutator.ledger().is_empty());
    }

    #[test]
    fn missing_file_is_a_filesystem_error() {
        let dir = TempDir::new().unwrap();
        let mut mutator = FileMutator::new(Approve);
        assert!(matches!(
            mutator.delete_file(&dir.path().join("nope.txt")),
            Err(MaestroError::FileSystem { .. })
        ));
    }
}

//! Builder for creating and configuring PlanManager instances.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::TextGenerator;
use crate::error::{MaestroError, Result};
use crate::store::{PlanStore, DEFAULT_NAMESPACE};

use super::PlanManager;

/// Builder for creating and configuring PlanManager instances.
#[derive(Default)]
pub struct PlanManagerBuilder {
    database_path: Option<PathBuf>,
    namespace: Option<String>,
    generator: Option<Arc<dyn TextGenerator>>,
}

impl PlanManagerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/maestro/maestro.db` or
    /// `~/.local/share/maestro/maestro.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the state namespace. Defaults to `"default"`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the text generator used for plan building.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Builds the configured manager, restoring any persisted plan state.
    ///
    /// # Errors
    ///
    /// Returns `MaestroError::Configuration` if no generator was provided,
    /// `MaestroError::FileSystem` if the database path is invalid, and
    /// `MaestroError::Database` if initialization fails.
    pub async fn build(self) -> Result<PlanManager> {
        let generator = self.generator.ok_or_else(|| MaestroError::Configuration {
            message: "PlanManagerBuilder requires a generator".to_string(),
        })?;

        let db_path = if let Some(path) = self.database_path {
            path
        } else {
            Self::default_database_path()?
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MaestroError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let namespace = self.namespace.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let store = PlanStore::new(db_path);
        // Opens the database (initializing the schema) and restores state;
        // malformed state comes back as the empty plan.
        let state = store.load(&namespace).await?;

        Ok(PlanManager::new(state, store, namespace, generator))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("maestro")
            .place_data_file("maestro.db")
            .map_err(|e| MaestroError::XdgDirectory(e.to_string()))
    }
}

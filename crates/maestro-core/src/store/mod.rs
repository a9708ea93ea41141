//! Durable plan persistence over SQLite.
//!
//! The store keeps one serialized [`PlanState`] per namespace in a single
//! key/value table. Reads are forgiving: a missing row or a payload that no
//! longer deserializes yields the empty plan, and an out-of-range cursor is
//! clamped. Writes go through `spawn_blocking` so rusqlite never blocks the
//! async runtime.

use std::path::{Path, PathBuf};

use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;

use crate::error::{DatabaseResultExt, MaestroError, Result};
use crate::models::PlanState;

/// Default namespace used when the caller does not partition state.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Database connection and schema handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initializes the database schema using the embedded SQL file.
    fn initialize_schema(&self) -> Result<()> {
        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Read the raw payload for a namespace.
    fn read_payload(&self, namespace: &str) -> Result<Option<String>> {
        self.connection
            .query_row(
                "SELECT payload FROM plan_state WHERE namespace = ?1",
                params![namespace],
                |row| row.get(0),
            )
            .optional()
            .db_context("Failed to read plan state")
    }

    /// Upsert the payload for a namespace.
    fn write_payload(&self, namespace: &str, payload: &str) -> Result<()> {
        let updated_at = jiff::Timestamp::now().to_string();
        self.connection
            .execute(
                "INSERT INTO plan_state (namespace, payload, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(namespace) DO UPDATE SET
                     payload = excluded.payload,
                     updated_at = excluded.updated_at",
                params![namespace, payload, updated_at],
            )
            .db_context("Failed to write plan state")?;
        Ok(())
    }
}

/// Async facade over the database, opened per operation.
#[derive(Debug, Clone)]
pub struct PlanStore {
    db_path: PathBuf,
}

impl PlanStore {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Load the plan state for a namespace. Missing or malformed data
    /// degrades to the empty plan rather than failing.
    pub async fn load(&self, namespace: &str) -> Result<PlanState> {
        let db_path = self.db_path.clone();
        let namespace = namespace.to_string();
        run_blocking(move || {
            let db = Database::new(&db_path)?;
            let Some(payload) = db.read_payload(&namespace)? else {
                return Ok(PlanState::default());
            };
            match serde_json::from_str::<PlanState>(&payload) {
                Ok(mut state) => {
                    state.normalize();
                    Ok(state)
                }
                Err(e) => {
                    warn!("stored plan state is malformed ({e}), starting with an empty plan");
                    Ok(PlanState::default())
                }
            }
        })
        .await
    }

    /// Persist the plan state for a namespace.
    pub async fn save(&self, namespace: &str, state: &PlanState) -> Result<()> {
        let db_path = self.db_path.clone();
        let namespace = namespace.to_string();
        let payload = serde_json::to_string(state)?;
        run_blocking(move || {
            let db = Database::new(&db_path)?;
            db.write_payload(&namespace, &payload)
        })
        .await
    }
}

/// Run a blocking database closure on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| MaestroError::Configuration {
            message: format!("Task join error: {e}"),
        })?
}

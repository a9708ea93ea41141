//! Core library for the Maestro plan/execute orchestration engine.
//!
//! Maestro turns a natural-language request into a numbered plan of steps,
//! walks the plan under user control, gates every side-effecting operation
//! behind explicit confirmation, and records inverse actions in an
//! in-memory undo ledger. Plan state survives restarts through a SQLite
//! store; text generation goes through a retrying, streaming HTTP client
//! behind the [`backend::TextGenerator`] seam.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use maestro_core::backend::{BackendClient, BackendConfig};
//! use maestro_core::PlanManagerBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(BackendClient::new(BackendConfig::new(
//!     "http://localhost:3000",
//! )));
//!
//! let mut manager = PlanManagerBuilder::new()
//!     .with_database_path(Some("maestro.db"))
//!     .with_generator(backend)
//!     .build()
//!     .await?;
//!
//! let steps = manager.build_plan_from_prompt("add a parser module").await?;
//! println!("plan has {} step(s)", steps.len());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod display;
pub mod error;
pub mod fsops;
pub mod gate;
pub mod ledger;
pub mod manager;
pub mod models;
pub mod params;
pub mod parser;
pub mod prompts;
pub mod router;
pub mod store;

// Re-export commonly used types
pub use backend::{BackendClient, BackendConfig, GenerateOptions, Generated, TextGenerator};
pub use display::{PlanOverview, StepDetail};
pub use error::{MaestroError, Result};
pub use fsops::FileMutator;
pub use gate::{Confirmer, Review, SideEffectGate};
pub use ledger::{UndoEntry, UndoLedger};
pub use manager::{PlanManager, PlanManagerBuilder, PlanRun, StepChoice, StepExecutor, StepPrompter};
pub use models::{
    OperationType, PlanPhase, PlanState, PlanStep, SideEffectOperation, StepStatus,
};
pub use params::{BuildPlan, StepRef};
pub use router::{classify_request, route_agent, AgentRoute, Mode, RequestKind};
pub use store::PlanStore;

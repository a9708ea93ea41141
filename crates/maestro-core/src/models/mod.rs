//! Data models for plans, steps, and side-effecting operations.

pub mod operation;
pub mod state;
pub mod status;
pub mod step;

pub use operation::{OperationType, SideEffectOperation};
pub use state::{PlanPhase, PlanState};
pub use status::StepStatus;
pub use step::PlanStep;

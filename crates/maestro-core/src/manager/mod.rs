//! Plan orchestration.
//!
//! [`PlanManager`] is the single owner of the active plan. It builds plans
//! from prompts, walks them interactively, runs individual steps out of
//! sequence, and persists the state after every mutation so an interrupted
//! session resumes where it left off.

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};

use crate::backend::{GenerateOptions, TextGenerator};
use crate::error::{MaestroError, Result};
use crate::models::{PlanPhase, PlanState, PlanStep, StepStatus};
use crate::parser::{fallback_plan, parse_plan};
use crate::prompts::PLAN_SYSTEM_PROMPT;
use crate::store::PlanStore;

pub mod builder;

pub use builder::PlanManagerBuilder;

/// The user's choice for the step the cursor points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepChoice {
    /// Run the step
    Execute,
    /// Mark it skipped and move on
    Skip,
    /// Freeze the cursor and leave the loop
    Stop,
}

/// UI seam for the interactive run loop.
pub trait StepPrompter {
    fn choose(&mut self, step: &PlanStep) -> StepChoice;
}

/// Executes a single step's instruction and returns its output.
#[async_trait]
pub trait StepExecutor: Send {
    async fn execute(&mut self, step: &PlanStep) -> Result<String>;
}

/// Outcome of an interactive run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanRun {
    /// Every remaining step was executed or skipped
    Completed,
    /// The user stopped; the cursor stays at the given offset
    Stopped { at: usize },
    /// There was no runnable step to begin with
    NothingToRun,
}

/// Owner and orchestrator of the active plan.
pub struct PlanManager {
    state: PlanState,
    store: PlanStore,
    namespace: String,
    generator: Arc<dyn TextGenerator>,
}

impl PlanManager {
    pub(crate) fn new(
        state: PlanState,
        store: PlanStore,
        namespace: String,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            state,
            store,
            namespace,
            generator,
        }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.state.steps
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    pub fn phase(&self) -> PlanPhase {
        self.state.phase()
    }

    /// Build a fresh plan from a natural-language prompt. Generation
    /// failures degrade to the synthetic single-step plan; the cursor is
    /// reset either way, so rebuilding over a finished plan starts clean.
    pub async fn build_plan_from_prompt(&mut self, prompt: &str) -> Result<&[PlanStep]> {
        let options = GenerateOptions::new().with_system_prompt(PLAN_SYSTEM_PROMPT);
        let steps = match self.generator.generate(prompt, options).await {
            Ok(generated) => parse_plan(&generated.text, prompt),
            Err(e) => {
                warn!("plan generation failed ({e}), using single-step fallback plan");
                fallback_plan(prompt)
            }
        };
        info!("built plan with {} step(s)", steps.len());
        self.state = PlanState { steps, cursor: 0 };
        self.persist().await?;
        Ok(&self.state.steps)
    }

    /// Walk the plan from the cursor, asking the prompter before each step.
    /// A failing step is marked failed, the cursor freezes at its offset,
    /// and the failure surfaces with the step's title; a rerun resumes at
    /// the failed step.
    pub async fn run_plan_interactively(
        &mut self,
        prompter: &mut dyn StepPrompter,
        executor: &mut dyn StepExecutor,
    ) -> Result<PlanRun> {
        if self.state.phase() != PlanPhase::InProgress {
            return Ok(PlanRun::NothingToRun);
        }

        while self.state.cursor < self.state.steps.len() {
            let offset = self.state.cursor;
            match prompter.choose(&self.state.steps[offset]) {
                StepChoice::Stop => {
                    info!("run stopped at step {}", offset + 1);
                    return Ok(PlanRun::Stopped { at: offset });
                }
                StepChoice::Skip => {
                    self.state.steps[offset].status = StepStatus::Skipped;
                    self.state.cursor = offset + 1;
                    self.persist().await?;
                }
                StepChoice::Execute => {
                    self.execute_at(offset, executor).await?;
                }
            }
        }
        Ok(PlanRun::Completed)
    }

    /// Run one step out of sequence. On success the cursor only ever moves
    /// forward; on failure it moves to the failing offset so the next run
    /// retries that step.
    pub async fn run_single_step(
        &mut self,
        offset: usize,
        executor: &mut dyn StepExecutor,
    ) -> Result<String> {
        self.check_offset(offset)?;
        self.execute_at(offset, executor).await
    }

    /// Mark one step skipped without running it.
    pub async fn skip_step(&mut self, offset: usize) -> Result<()> {
        self.check_offset(offset)?;
        self.state.steps[offset].status = StepStatus::Skipped;
        self.state.cursor = self.state.cursor.max(offset + 1);
        self.persist().await
    }

    /// Drop the plan and persist the empty state.
    pub async fn clear(&mut self) -> Result<()> {
        self.state = PlanState::default();
        self.persist().await
    }

    async fn execute_at(&mut self, offset: usize, executor: &mut dyn StepExecutor) -> Result<String> {
        self.state.steps[offset].status = StepStatus::Running;
        let step = self.state.steps[offset].clone();

        match executor.execute(&step).await {
            Ok(output) => {
                self.state.steps[offset].status = StepStatus::Completed;
                self.state.cursor = self.state.cursor.max(offset + 1);
                self.persist().await?;
                Ok(output)
            }
            Err(e) => {
                self.state.steps[offset].status = StepStatus::Failed;
                self.state.cursor = offset;
                self.persist().await?;
                Err(MaestroError::step_failed(step.title, e.to_string()))
            }
        }
    }

    fn check_offset(&self, offset: usize) -> Result<()> {
        let len = self.state.steps.len();
        if offset >= len {
            return Err(MaestroError::StepOutOfRange { index: offset, len });
        }
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        self.store.save(&self.namespace, &self.state).await
    }
}

//! Command handlers wiring the orchestrator to the terminal.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use maestro_core::backend::{BackendClient, GenerateOptions};
use maestro_core::prompts::{prompt_for, EditorContext};
use maestro_core::{
    classify_request, route_agent, AgentRoute, FileMutator, Mode, PlanManager, PlanOverview,
    PlanRun, PlanStep, StepDetail, StepExecutor, StepRef,
};

use crate::args::{FsCommands, PlanCommands};
use crate::prompt::{self, StdinConfirmer, StdinPrompter};
use crate::renderer::TerminalRenderer;

/// Executor that sends a step's instruction to the backend. With
/// `stream_to_stdout` the response is printed fragment by fragment as it
/// arrives; the MCP server uses the quiet variant since stdout carries the
/// protocol there.
pub struct BackendStepExecutor {
    backend: Arc<BackendClient>,
    stream_to_stdout: bool,
}

impl BackendStepExecutor {
    pub fn new(backend: Arc<BackendClient>, stream_to_stdout: bool) -> Self {
        Self {
            backend,
            stream_to_stdout,
        }
    }
}

#[async_trait]
impl StepExecutor for BackendStepExecutor {
    async fn execute(&mut self, step: &PlanStep) -> maestro_core::Result<String> {
        let mut options = GenerateOptions::new();
        if self.stream_to_stdout {
            options = options.with_progress(|fragment| {
                print!("{fragment}");
                let _ = io::stdout().flush();
            });
        }
        let generated = self.backend.generate(&step.instruction, options).await?;
        if self.stream_to_stdout {
            println!();
        }
        Ok(generated.text)
    }
}

/// CLI command dispatcher holding the orchestrator and output sinks.
pub struct Cli {
    manager: PlanManager,
    backend: Arc<BackendClient>,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(manager: PlanManager, backend: Arc<BackendClient>, renderer: TerminalRenderer) -> Self {
        Self {
            manager,
            backend,
            renderer,
        }
    }

    /// Route a chat message by mode: answer directly, always plan, or let
    /// the backend classify first.
    pub async fn handle_chat(mut self, prompt: &str, mode: Mode) -> Result<()> {
        match mode {
            Mode::Ask => self.answer(prompt).await,
            Mode::Plan => self.build_and_show(prompt).await,
            Mode::Agent => match route_agent(self.backend.as_ref(), prompt).await {
                AgentRoute::Task => {
                    self.build_and_show(prompt).await?;
                    println!("Run it with `maestro plan run`.");
                    Ok(())
                }
                AgentRoute::Conversational => self.answer(prompt).await,
            },
        }
    }

    pub async fn handle_plan_command(mut self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Build { prompt } => self.build_and_show(&prompt).await,
            PlanCommands::Show => self.show_plan(),
            PlanCommands::Run => {
                let mut prompter = StdinPrompter;
                let mut executor = BackendStepExecutor::new(Arc::clone(&self.backend), true);
                let outcome = self
                    .manager
                    .run_plan_interactively(&mut prompter, &mut executor)
                    .await
                    .context("Plan run failed")?;
                match outcome {
                    PlanRun::Completed => println!("Plan complete."),
                    PlanRun::Stopped { at } => {
                        println!("Stopped. Resume later with `maestro plan run` (next step: {}).", at + 1);
                    }
                    PlanRun::NothingToRun => println!("Nothing to run."),
                }
                Ok(())
            }
            PlanCommands::Step { index } => {
                let offset = StepRef { index }
                    .offset()
                    .context("Step numbers start at 1")?;
                if let Some(step) = self.manager.steps().get(offset) {
                    self.renderer.render(&StepDetail(step).to_string())?;
                }
                let mut executor = BackendStepExecutor::new(Arc::clone(&self.backend), true);
                self.manager
                    .run_single_step(offset, &mut executor)
                    .await
                    .context("Step execution failed")?;
                Ok(())
            }
            PlanCommands::Skip { index } => {
                let offset = StepRef { index }
                    .offset()
                    .context("Step numbers start at 1")?;
                self.manager
                    .skip_step(offset)
                    .await
                    .context("Failed to skip step")?;
                println!("Skipped step {index}.");
                Ok(())
            }
            PlanCommands::Clear => {
                self.manager.clear().await.context("Failed to clear plan")?;
                println!("Plan cleared.");
                Ok(())
            }
        }
    }

    /// Run one gated file operation. Every branch asks for confirmation
    /// before touching anything. The undo ledger is in-memory and scoped to
    /// this process, so the chance to revert is offered right after the
    /// operation applies.
    pub fn handle_fs_command(self, command: FsCommands) -> Result<()> {
        let mut mutator = FileMutator::new(StdinConfirmer);
        let applied = match command {
            FsCommands::Create { path, content } => mutator.create_file(&path, &content)?,
            FsCommands::Delete { path } => mutator.delete_file(&path)?,
            FsCommands::Move { from, to } => mutator.move_file(&from, &to)?,
            FsCommands::Replace { path, content } => mutator.replace_file(&path, &content)?,
            FsCommands::Append { path, content } => mutator.append_to_file(&path, &content)?,
        };
        match applied {
            Some(()) => {
                println!("Applied.");
                if matches!(prompt::ask("Undo this change? [y/N]: ").as_str(), "y" | "yes") {
                    if let Some(description) = mutator.undo_last()? {
                        println!("Undid: {description}.");
                    }
                }
            }
            None => println!("Cancelled, nothing changed."),
        }
        Ok(())
    }

    pub fn show_plan(&self) -> Result<()> {
        let overview = PlanOverview::new(self.manager.steps(), self.manager.cursor());
        self.renderer.render(&overview.to_string())
    }

    async fn build_and_show(&mut self, prompt: &str) -> Result<()> {
        self.manager
            .build_plan_from_prompt(prompt)
            .await
            .context("Failed to build plan")?;
        self.show_plan()
    }

    /// Answer conversationally, streaming fragments as they arrive. When
    /// the backend is down the degraded local fallback is printed whole.
    async fn answer(&self, prompt: &str) -> Result<()> {
        let kind = classify_request(prompt);
        let full_prompt = prompt_for(kind, prompt, &EditorContext::default());

        let streamed = Arc::new(AtomicBool::new(false));
        let streamed_flag = Arc::clone(&streamed);
        let options = GenerateOptions::new().with_progress(move |fragment| {
            streamed_flag.store(true, Ordering::Relaxed);
            print!("{fragment}");
            let _ = io::stdout().flush();
        });

        let generated = self
            .backend
            .generate_or_simulate(&full_prompt, options)
            .await
            .context("Chat request failed")?;

        if streamed.load(Ordering::Relaxed) {
            println!();
        } else {
            println!("{}", generated.text);
        }
        Ok(())
    }
}

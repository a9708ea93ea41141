//! Interactive stdin prompts: the confirmation dialog for side-effecting
//! operations and the per-step choice in plan runs.
//!
//! Both default to the safe answer (cancel / stop) on empty input or a
//! closed stdin, so piping `yes ''` through the CLI never applies anything.

use std::io::{self, BufRead, Write};

use maestro_core::gate::{Confirmer, Review};
use maestro_core::manager::{StepChoice, StepPrompter};
use maestro_core::models::{PlanStep, SideEffectOperation};

pub fn ask(question: &str) -> String {
    print!("{question}");
    let _ = io::stdout().flush();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return String::new();
    }
    line.trim().to_lowercase()
}

/// Stdin-backed confirmation dialog for the side-effect gate.
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn review(&mut self, operation: &SideEffectOperation) -> Review {
        println!("About to {operation}");
        match ask("Apply? [y]es / [p]review / [N]o: ").as_str() {
            "y" | "yes" => Review::Apply,
            "p" | "preview" => Review::Preview,
            _ => Review::Cancel,
        }
    }

    fn confirm_after_preview(
        &mut self,
        operation: &SideEffectOperation,
        preview: Option<&str>,
    ) -> bool {
        match preview {
            Some(content) => println!("--- preview ---\n{content}\n--- end preview ---"),
            None => println!("(no preview available)"),
        }
        matches!(
            ask(&format!("Apply {operation}? [y/N]: ")).as_str(),
            "y" | "yes"
        )
    }
}

/// Stdin-backed step chooser for interactive plan runs.
pub struct StdinPrompter;

impl StepPrompter for StdinPrompter {
    fn choose(&mut self, step: &PlanStep) -> StepChoice {
        println!();
        println!("Step {}: {}", step.index, step.title);
        if !step.intent.is_empty() {
            println!("  {}", step.intent);
        }
        if step.side_effects {
            println!("  (may have side effects)");
        }
        match ask("[e]xecute / [s]kip / [q]uit: ").as_str() {
            "e" | "execute" => StepChoice::Execute,
            "s" | "skip" => StepChoice::Skip,
            _ => StepChoice::Stop,
        }
    }
}

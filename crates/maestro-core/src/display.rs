//! Display wrappers for terminal output.
//!
//! Domain models stay presentation-free; these wrappers render them as
//! markdown for the CLI's terminal renderer.

use std::fmt;

use crate::models::{PlanPhase, PlanStep};

/// Markdown rendering of the whole plan with the cursor position.
pub struct PlanOverview<'a> {
    steps: &'a [PlanStep],
    cursor: usize,
}

impl<'a> PlanOverview<'a> {
    pub fn new(steps: &'a [PlanStep], cursor: usize) -> Self {
        Self { steps, cursor }
    }

    fn phase(&self) -> PlanPhase {
        if self.steps.is_empty() {
            PlanPhase::NoPlan
        } else if self.cursor >= self.steps.len() {
            PlanPhase::Complete
        } else {
            PlanPhase::InProgress
        }
    }
}

impl fmt::Display for PlanOverview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return writeln!(f, "No active plan. Build one with `plan build <prompt>`.");
        }

        writeln!(f, "# Active Plan")?;
        writeln!(f)?;
        for (offset, step) in self.steps.iter().enumerate() {
            let marker = if offset == self.cursor { "→" } else { " " };
            let effects = if step.side_effects {
                " *(side effects)*"
            } else {
                ""
            };
            writeln!(
                f,
                "{marker} {}. [{}] **{}**{effects}",
                step.index,
                step.status.with_icon(),
                step.title
            )?;
            if !step.intent.is_empty() {
                writeln!(f, "     {}", step.intent)?;
            }
        }
        writeln!(f)?;
        match self.phase() {
            PlanPhase::Complete => writeln!(f, "All {} step(s) visited.", self.steps.len()),
            _ => writeln!(
                f,
                "Next step: {} of {}.",
                self.cursor + 1,
                self.steps.len()
            ),
        }
    }
}

/// Markdown rendering of a single step with full detail.
pub struct StepDetail<'a>(pub &'a PlanStep);

impl fmt::Display for StepDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = self.0;
        writeln!(f, "## Step {}: {}", step.index, step.title)?;
        writeln!(f)?;
        writeln!(f, "- **Status**: {}", step.status.with_icon())?;
        if !step.intent.is_empty() {
            writeln!(f, "- **Intent**: {}", step.intent)?;
        }
        writeln!(f, "- **Side effects**: {}", step.side_effects)?;
        if !step.instruction.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", step.instruction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StepStatus;

    fn sample() -> Vec<PlanStep> {
        vec![
            PlanStep::new(1, "Create module", "scaffold it", true, "create src/m.rs"),
            PlanStep::new(2, "Explain", "document it", false, "explain the module"),
        ]
    }

    #[test]
    fn empty_plan_has_hint() {
        let rendered = PlanOverview::new(&[], 0).to_string();
        assert!(rendered.contains("No active plan"));
    }

    #[test]
    fn overview_marks_cursor_and_effects() {
        let steps = sample();
        let rendered = PlanOverview::new(&steps, 1).to_string();
        assert!(rendered.contains("→ 2."));
        assert!(rendered.contains("*(side effects)*"));
        assert!(rendered.contains("Next step: 2 of 2."));
    }

    #[test]
    fn completed_plan_says_so() {
        let mut steps = sample();
        for step in &mut steps {
            step.status = StepStatus::Completed;
        }
        let rendered = PlanOverview::new(&steps, 2).to_string();
        assert!(rendered.contains("All 2 step(s) visited."));
    }

    #[test]
    fn step_detail_includes_instruction() {
        let steps = sample();
        let rendered = StepDetail(&steps[0]).to_string();
        assert!(rendered.contains("## Step 1: Create module"));
        assert!(rendered.contains("create src/m.rs"));
    }
}

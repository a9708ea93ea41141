use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use maestro_core::backend::{GenerateOptions, Generated, TextGenerator};
use maestro_core::{
    MaestroError, PlanManager, PlanManagerBuilder, PlanStep, Result, StepChoice, StepExecutor,
    StepPrompter,
};

/// Generator that answers from a fixed script, one entry per call.
/// An exhausted script or an `Err` entry produces a backend error.
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
}

impl ScriptedGenerator {
    pub fn replying(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(|s| Ok(s.to_string())).collect()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str, _options: GenerateOptions) -> Result<Generated> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(Generated {
                text,
                degraded: false,
            }),
            Some(Err(message)) => Err(MaestroError::backend(message).after_attempts(3)),
            None => Err(MaestroError::backend("script exhausted").after_attempts(3)),
        }
    }
}

/// Executor that records the titles it ran and can fail on one of them.
#[derive(Default)]
pub struct RecordingExecutor {
    pub executed: Vec<String>,
    pub fail_on: Option<String>,
}

impl RecordingExecutor {
    pub fn failing_on(title: &str) -> Self {
        Self {
            executed: Vec::new(),
            fail_on: Some(title.to_string()),
        }
    }
}

#[async_trait]
impl StepExecutor for RecordingExecutor {
    async fn execute(&mut self, step: &PlanStep) -> Result<String> {
        self.executed.push(step.title.clone());
        if self.fail_on.as_deref() == Some(step.title.as_str()) {
            return Err(MaestroError::Configuration {
                message: "executor blew up".to_string(),
            });
        }
        Ok(format!("ran {}", step.title))
    }
}

/// Prompter that follows a fixed choice script; exhausted scripts stop.
pub struct ScriptedPrompter {
    choices: VecDeque<StepChoice>,
}

impl ScriptedPrompter {
    pub fn new(choices: Vec<StepChoice>) -> Self {
        Self {
            choices: choices.into(),
        }
    }
}

impl StepPrompter for ScriptedPrompter {
    fn choose(&mut self, _step: &PlanStep) -> StepChoice {
        self.choices.pop_front().unwrap_or(StepChoice::Stop)
    }
}

/// Build a manager over the given database file.
pub async fn manager_at(
    db_path: &Path,
    generator: Arc<dyn TextGenerator>,
) -> PlanManager {
    PlanManagerBuilder::new()
        .with_database_path(Some(db_path))
        .with_generator(generator)
        .build()
        .await
        .expect("Failed to create manager")
}

/// A plan JSON document with one step per title.
pub fn plan_json(titles: &[&str]) -> String {
    let steps: Vec<String> = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            format!(
                r#"{{"index": {}, "title": "{}", "intent": "intent {}", "sideEffects": false, "instruction": "do {}"}}"#,
                i + 1,
                title,
                i + 1,
                title
            )
        })
        .collect();
    format!("[{}]", steps.join(","))
}

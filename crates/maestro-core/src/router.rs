//! Mode routing and request classification.
//!
//! Two independent concerns live here. The *mode* (ask / plan / agent) is
//! an explicit user choice and decides which pipeline a message enters.
//! The *request kind* is a keyword heuristic that only selects a prompt
//! template; it never changes the pipeline. In agent mode the backend is
//! additionally asked whether a message is a task at all, and any
//! uncertainty lands on the conversational side: action is never the
//! default outcome of ambiguity.

use std::str::FromStr;

use log::debug;

use crate::backend::{GenerateOptions, TextGenerator};
use crate::prompts::classification_prompt;

/// Interaction mode, selected explicitly by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Answer directly, no planning
    #[default]
    Ask,
    /// Always build a plan
    Plan,
    /// Classify first, then plan or answer
    Agent,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ask" => Ok(Mode::Ask),
            "plan" => Ok(Mode::Plan),
            "agent" => Ok(Mode::Agent),
            _ => Err(format!("Invalid mode: {s}")),
        }
    }
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Ask => "ask",
            Mode::Plan => "plan",
            Mode::Agent => "agent",
        }
    }
}

/// Heuristic category of a request, used to pick a prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    CodeGeneration,
    FileOperation,
    Explanation,
    ErrorDiagnosis,
    ProjectAnalysis,
    Chat,
}

/// Classify a request by keywords. First match in a fixed priority order
/// wins; each category is checked independently of the others.
pub fn classify_request(prompt: &str) -> RequestKind {
    let lower = prompt.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(&["error", "exception", "bug", "crash", "stack trace", "doesn't work", "broken"])
        || (has(&["fix"]) && !has(&["prefix", "suffix"]))
    {
        return RequestKind::ErrorDiagnosis;
    }
    if has(&["file", "folder", "directory"])
        && has(&["create", "delete", "remove", "move", "rename", "copy"])
    {
        return RequestKind::FileOperation;
    }
    if has(&["write", "create", "generate", "implement", "add", "build"])
        && has(&["code", "function", "class", "method", "module", "script", "test", "component"])
    {
        return RequestKind::CodeGeneration;
    }
    if has(&["analyze", "analyse", "review", "audit"])
        && has(&["project", "codebase", "repository", "architecture", "structure"])
    {
        return RequestKind::ProjectAnalysis;
    }
    if has(&["explain", "what is", "what does", "how does", "why does", "describe"]) {
        return RequestKind::Explanation;
    }
    RequestKind::Chat
}

/// Where an agent-mode message is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRoute {
    /// Build and run a plan
    Task,
    /// Answer conversationally
    Conversational,
}

/// Ask the backend whether `prompt` is a task request. The model is
/// expected to answer a bare `true` or `false`; anything else, including a
/// transport failure, routes conversationally.
pub async fn route_agent(generator: &dyn TextGenerator, prompt: &str) -> AgentRoute {
    let question = classification_prompt(prompt);
    match generator.generate(&question, GenerateOptions::new()).await {
        Ok(generated) => {
            let answer = generated.text.trim().to_lowercase();
            if answer.starts_with("true") {
                AgentRoute::Task
            } else {
                AgentRoute::Conversational
            }
        }
        Err(e) => {
            debug!("task classification failed ({e}), treating as conversational");
            AgentRoute::Conversational
        }
    }
}

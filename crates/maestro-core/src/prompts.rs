//! Prompt templates for plan generation and request classification.

use crate::router::RequestKind;

/// System instruction for plan generation. The parser tolerates prose
/// around the array, but the instruction asks for bare JSON to keep
/// extraction reliable.
pub const PLAN_SYSTEM_PROMPT: &str = r#"You are a planning assistant. Break the user's request into a short sequence of concrete steps.

Respond with ONLY a JSON array, no prose, no markdown fences. Each element must have exactly these fields:
- "index": 1-based step number
- "title": short step title
- "intent": what the step achieves
- "sideEffects": true if the step creates, modifies, deletes, or moves files
- "instruction": the precise instruction to execute for this step

Example:
[
  {"index": 1, "title": "Create module", "intent": "Add the new parser module", "sideEffects": true, "instruction": "Create src/parser.js with an empty parse function"},
  {"index": 2, "title": "Explain usage", "intent": "Document how to call the parser", "sideEffects": false, "instruction": "Explain how to call parse() from the main entry point"}
]

Output ONLY the JSON array."#;

/// Build the binary task/conversation classification prompt.
///
/// The model is asked for a bare `true`/`false`; anything else is treated
/// as a classification failure by the caller.
pub fn classification_prompt(request: &str) -> String {
    format!(
        "Decide whether the following user message asks you to perform a task \
         (create, modify, fix, or analyze code or files) or is conversational \
         (a question, a greeting, a discussion).\n\n\
         Message: {request}\n\n\
         Answer with exactly one word: true if it is a task, false otherwise."
    )
}

/// Optional editor context folded into request prompts.
#[derive(Debug, Clone, Default)]
pub struct EditorContext {
    /// Text currently selected in the editor
    pub selected_text: Option<String>,
    /// Path of the active file
    pub file_path: Option<String>,
    /// Short outline of the project structure
    pub project_outline: Option<String>,
}

impl EditorContext {
    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(path) = &self.file_path {
            out.push_str(&format!("\n\nActive file: {path}"));
        }
        if let Some(selection) = &self.selected_text {
            out.push_str(&format!("\n\nSelected text:\n{selection}"));
        }
        if let Some(outline) = &self.project_outline {
            out.push_str(&format!("\n\nProject outline:\n{outline}"));
        }
        out
    }
}

/// Build the prompt for a classified request, folding in editor context.
pub fn prompt_for(kind: RequestKind, request: &str, context: &EditorContext) -> String {
    let preamble = match kind {
        RequestKind::CodeGeneration => {
            "Write the requested code. Prefer complete, runnable snippets and \
             briefly note any assumptions."
        }
        RequestKind::FileOperation => {
            "Describe the exact file operations needed for this request as a \
             short list of create/modify/delete/move actions with paths."
        }
        RequestKind::Explanation => {
            "Explain the following clearly and concisely, using the provided \
             context where relevant."
        }
        RequestKind::ErrorDiagnosis => {
            "Diagnose the error described below. Identify the likely cause \
             first, then suggest a fix."
        }
        RequestKind::ProjectAnalysis => {
            "Analyze the project described below and summarize its structure, \
             key components, and any notable issues."
        }
        RequestKind::Chat => "Answer the user's message helpfully.",
    };
    format!("{preamble}\n\nRequest: {request}{}", context.render())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_folded_into_prompt() {
        let context = EditorContext {
            selected_text: Some("let x = 1;".to_string()),
            file_path: Some("src/main.rs".to_string()),
            project_outline: None,
        };
        let prompt = prompt_for(RequestKind::Explanation, "what does this do", &context);
        assert!(prompt.contains("what does this do"));
        assert!(prompt.contains("src/main.rs"));
        assert!(prompt.contains("let x = 1;"));
    }

    #[test]
    fn empty_context_adds_nothing() {
        let prompt = prompt_for(RequestKind::Chat, "hello", &EditorContext::default());
        assert!(prompt.ends_with("Request: hello"));
    }
}

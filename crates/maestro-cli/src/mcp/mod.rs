//! MCP server implementation for Maestro
//!
//! Exposes the plan orchestrator over the Model Context Protocol so AI
//! hosts can build, inspect, and advance plans. Step execution here is
//! quiet: stdout carries the protocol, so nothing streams to it.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, error, info};
use maestro_core::{
    BuildPlan, MaestroError, PlanManager, PlanOverview, StepRef,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::Mutex,
};

use crate::cli::BackendStepExecutor;

pub mod errors;

use errors::to_mcp_error;

/// Result type for MCP tool handlers
pub type McpResult = Result<CallToolResult, McpError>;

/// MCP server for Maestro
#[derive(Clone)]
pub struct MaestroMcpServer {
    manager: Arc<Mutex<PlanManager>>,
    backend: Arc<maestro_core::BackendClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MaestroMcpServer {
    /// Create a new Maestro MCP server
    pub fn new(manager: PlanManager, backend: Arc<maestro_core::BackendClient>) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
            backend,
            tool_router: Self::tool_router(),
        }
    }

    fn overview(manager: &PlanManager) -> String {
        PlanOverview::new(manager.steps(), manager.cursor()).to_string()
    }

    fn offset_of(params: &StepRef) -> Result<usize, McpError> {
        params
            .offset()
            .ok_or_else(|| McpError::invalid_params("Step numbers start at 1", None))
    }

    #[tool(
        name = "build_plan",
        description = "Build a new execution plan from a natural-language request, replacing the current plan and resetting the cursor. Generation failures degrade to a single-step plan carrying the request verbatim, so a plan always exists afterwards. Returns the plan overview."
    )]
    async fn build_plan(&self, params: Parameters<BuildPlan>) -> McpResult {
        let mut manager = self.manager.lock().await;
        manager
            .build_plan_from_prompt(&params.0.prompt)
            .await
            .map_err(|e| to_mcp_error("Failed to build plan", e))?;
        Ok(CallToolResult::success(vec![Content::text(
            Self::overview(&manager),
        )]))
    }

    #[tool(
        name = "show_plan",
        description = "Show the active plan: every step with its status (pending/running/completed/skipped/failed), the cursor position, and overall progress."
    )]
    async fn show_plan(&self) -> McpResult {
        let manager = self.manager.lock().await;
        Ok(CallToolResult::success(vec![Content::text(
            Self::overview(&manager),
        )]))
    }

    #[tool(
        name = "run_step",
        description = "Execute one plan step by its 1-based number, sending its instruction to the backend. On success the cursor advances (never rewinds); on failure the step is marked failed and the cursor moves to it so the next run retries. Returns the step output."
    )]
    async fn run_step(&self, params: Parameters<StepRef>) -> McpResult {
        let offset = Self::offset_of(&params.0)?;
        let mut manager = self.manager.lock().await;
        let mut executor = BackendStepExecutor::new(Arc::clone(&self.backend), false);
        let output = manager
            .run_single_step(offset, &mut executor)
            .await
            .map_err(|e| match e {
                MaestroError::StepOutOfRange { .. } => {
                    McpError::invalid_params(e.to_string(), None)
                }
                other => to_mcp_error("Step execution failed", other),
            })?;
        Ok(CallToolResult::success(vec![Content::text(output)]))
    }

    #[tool(
        name = "skip_step",
        description = "Mark one plan step as skipped by its 1-based number without executing it. The cursor advances past it if it was the next step."
    )]
    async fn skip_step(&self, params: Parameters<StepRef>) -> McpResult {
        let offset = Self::offset_of(&params.0)?;
        let mut manager = self.manager.lock().await;
        manager.skip_step(offset).await.map_err(|e| match e {
            MaestroError::StepOutOfRange { .. } => McpError::invalid_params(e.to_string(), None),
            other => to_mcp_error("Failed to skip step", other),
        })?;
        Ok(CallToolResult::success(vec![Content::text(
            Self::overview(&manager),
        )]))
    }

    #[tool(
        name = "clear_plan",
        description = "Drop the active plan and persist the empty state. Use before starting unrelated work."
    )]
    async fn clear_plan(&self) -> McpResult {
        let mut manager = self.manager.lock().await;
        manager
            .clear()
            .await
            .map_err(|e| to_mcp_error("Failed to clear plan", e))?;
        Ok(CallToolResult::success(vec![Content::text(
            "Plan cleared.".to_string(),
        )]))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for MaestroMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "maestro".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                r#"Maestro turns natural-language requests into numbered execution plans and walks them step by step.

## Core Concepts
- **Plan**: a numbered sequence of steps built from one request; only one plan is active at a time
- **Cursor**: the next step to run; it survives restarts and freezes on a failing step so runs can resume
- **Step statuses**: pending, running, completed, skipped, failed

## Workflow
1. `build_plan` with the user's request - returns the plan overview
2. `show_plan` to inspect progress at any time
3. `run_step` / `skip_step` to advance through the steps in order (or out of order; the cursor never rewinds on success)
4. `clear_plan` when the work is done or abandoned

## Failure Behavior
- Plan generation never fails outright: unusable model output degrades to a single-step plan carrying the request verbatim
- A failing step is marked failed and the cursor moves to it; rerunning retries that step"#
                    .to_string(),
            ),
        }
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: MaestroMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting Maestro MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    // Set up signal handlers for graceful shutdown
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    info!("MCP server shutdown complete");
    Ok(())
}

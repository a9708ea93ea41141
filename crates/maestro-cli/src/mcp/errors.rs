//! Error handling utilities for MCP server

use maestro_core::MaestroError;
use rmcp::ErrorData;

/// Helper to convert orchestration errors to MCP errors
pub fn to_mcp_error(message: &str, error: MaestroError) -> ErrorData {
    ErrorData::internal_error(format!("{}: {}", message, error), None)
}

//! Maestro CLI Application
//!
//! Command-line interface for the Maestro plan/execute orchestration
//! engine.

mod args;
mod cli;
mod mcp;
mod prompt;
mod renderer;

use std::sync::Arc;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use maestro_core::backend::{BackendClient, BackendConfig};
use maestro_core::PlanManagerBuilder;
use mcp::{run_stdio_server, MaestroMcpServer};
use renderer::TerminalRenderer;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        no_color,
        endpoint,
        model,
        mode,
        command,
    } = Args::parse();

    let mut config = BackendConfig::new(endpoint);
    config.model = model;
    config.api_key = BackendConfig::api_key_from_env();
    let backend = Arc::new(BackendClient::new(config));

    let manager = PlanManagerBuilder::new()
        .with_database_path(database_file)
        .with_generator(Arc::clone(&backend) as Arc<dyn maestro_core::TextGenerator>)
        .build()
        .await
        .context("Failed to initialize plan manager")?;

    let renderer = TerminalRenderer::new(!no_color);

    info!("Maestro started");

    match command {
        Some(Chat { prompt }) => {
            Cli::new(manager, backend, renderer)
                .handle_chat(&prompt, mode.into())
                .await
        }
        Some(Plan { command }) => {
            Cli::new(manager, backend, renderer)
                .handle_plan_command(command)
                .await
        }
        Some(Fs { command }) => Cli::new(manager, backend, renderer).handle_fs_command(command),
        Some(Serve) => {
            info!("Starting Maestro MCP server");
            run_stdio_server(MaestroMcpServer::new(manager, backend))
                .await
                .context("MCP server failed")
        }
        None => Cli::new(manager, backend, renderer).show_plan(),
    }
}

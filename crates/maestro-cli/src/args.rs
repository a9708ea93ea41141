use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use maestro_core::Mode;

/// Command-line interface for the Maestro orchestration engine
///
/// Maestro turns natural-language requests into numbered execution plans,
/// walks them step by step under user control, and gates every
/// side-effecting operation behind explicit confirmation. It talks to a
/// chat backend over HTTP and can also run as an MCP (Model Context
/// Protocol) server for integration with AI assistants.
#[derive(Parser)]
#[command(version, about, name = "maestro")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/maestro/maestro.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Base URL of the chat backend
    #[arg(
        long,
        global = true,
        env = "MAESTRO_ENDPOINT",
        default_value = "http://localhost:3000"
    )]
    pub endpoint: String,

    /// Model identifier forwarded to the backend
    #[arg(long, global = true, env = "MAESTRO_MODEL")]
    pub model: Option<String>,

    /// Interaction mode for the chat command
    #[arg(long, global = true, value_enum, default_value_t = ModeArg::Ask)]
    pub mode: ModeArg,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI wrapper for the core interaction mode.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Answer directly, no planning
    Ask,
    /// Always build a plan
    Plan,
    /// Classify the request, then plan or answer
    Agent,
}

impl From<ModeArg> for Mode {
    fn from(val: ModeArg) -> Self {
        match val {
            ModeArg::Ask => Mode::Ask,
            ModeArg::Plan => Mode::Plan,
            ModeArg::Agent => Mode::Agent,
        }
    }
}

/// Available commands for the Maestro CLI
///
/// The CLI is organized into four command categories:
/// - `chat`: Send a message through the mode router
/// - `plan`: Build, inspect, and run the active plan
/// - `fs`: Gated file operations with an immediate undo offer
/// - `serve`: Start the MCP server for AI assistant integration
#[derive(Subcommand)]
pub enum Commands {
    /// Send a chat message through the current mode
    #[command(alias = "c")]
    Chat {
        /// The message or request
        prompt: String,
    },
    /// Manage the active plan
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Perform a gated file operation
    Fs {
        #[command(subcommand)]
        command: FsCommands,
    },
    /// Start the MCP server
    Serve,
}

/// Plan lifecycle commands
#[derive(Subcommand)]
pub enum PlanCommands {
    /// Build a new plan from a prompt, replacing the current one
    #[command(alias = "b")]
    Build {
        /// The request to break into steps
        prompt: String,
    },
    /// Show the active plan and cursor position
    #[command(alias = "s")]
    Show,
    /// Walk the plan interactively from the cursor
    #[command(alias = "r")]
    Run,
    /// Run a single step by its 1-based number
    Step {
        /// Step number as shown in the plan overview
        index: usize,
    },
    /// Skip a single step by its 1-based number
    Skip {
        /// Step number as shown in the plan overview
        index: usize,
    },
    /// Drop the active plan
    Clear,
}

/// Gated file operations. Every command asks for confirmation before
/// touching the filesystem, and an applied operation can be reverted on the
/// spot through the undo prompt that follows it.
#[derive(Subcommand)]
pub enum FsCommands {
    /// Create a new file with the given content
    Create { path: PathBuf, content: String },
    /// Delete a file (content is backed up for undo)
    Delete { path: PathBuf },
    /// Move or rename a file
    Move { from: PathBuf, to: PathBuf },
    /// Replace a file's content
    Replace { path: PathBuf, content: String },
    /// Append content to a file
    Append { path: PathBuf, content: String },
}

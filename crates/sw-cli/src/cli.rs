//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Stepwise - apply versioned SQL migrations exactly once
#[derive(Parser, Debug)]
#[command(name = "sw")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: PathBuf,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override database path (file path or :memory:)
    #[arg(short, long, global = true, env = "STEPWISE_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply all pending migrations
    Migrate(MigrateArgs),

    /// Show applied and pending migrations
    Status(StatusArgs),

    /// List discovered migrations without connecting to the database
    List(ListArgs),

    /// Create the next migration file
    New(NewArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Override the per-statement timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Only show pending migrations
    #[arg(long)]
    pub pending: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Short description, used for the file name and the description comment
    pub name: String,

    /// Branch subdirectory to place the migration in
    #[arg(short, long)]
    pub branch: Option<String>,
}

/// Output formats for listing commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

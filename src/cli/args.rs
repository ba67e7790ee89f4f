//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    category::CategoryCommands, completions::CompletionsArgs, init::InitArgs, part::PartCommands,
    project::ProjectCommands, run::RunCommands, setting::SettingCommands, status::StatusArgs,
    version::VersionArgs,
};

#[derive(Parser)]
#[command(name = "itree")]
#[command(author, version, about = "Inventory project bookkeeping")]
#[command(
    long_about = "Keep project categories, the parts each project consumes or produces, and production runs in a local SQLite database."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose (debug) logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Workspace root (default: auto-detect by finding .itree/)
    #[arg(long, short = 'C', global = true)]
    pub workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new itree workspace
    Init(InitArgs),

    /// Show version and build information
    Version(VersionArgs),

    /// Project category tree management
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Part management
    #[command(subcommand)]
    Part(PartCommands),

    /// Project management and project part associations
    #[command(subcommand)]
    Project(ProjectCommands),

    /// Production run records
    #[command(subcommand)]
    Run(RunCommands),

    /// Instance settings
    #[command(subcommand)]
    Setting(SettingCommands),

    /// Show workspace and database status
    Status(StatusArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable table
    #[default]
    Auto,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

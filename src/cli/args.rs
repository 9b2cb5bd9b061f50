//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// hostprep - idempotent, logged host provisioning.
#[derive(Debug, Parser)]
#[command(name = "hostprep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workflow file (default: ./hostprep.yml, then /etc/hostprep/workflow.yml)
    #[arg(short, long, global = true, env = "HOSTPREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Durable log file (overrides settings.log_path)
    #[arg(short, long, global = true, env = "HOSTPREP_LOG")]
    pub log: Option<PathBuf>,

    /// Only print the summary and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the workflow (default if no command specified)
    Run(RunArgs),

    /// Show the summary of the most recent run, rebuilt from the log
    Summary(SummaryArgs),

    /// List the workflow's steps
    List,

    /// Validate the workflow file
    Validate,

    /// Install the login banner hook
    InstallHook(InstallHookArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Run only specified steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Skip specified steps (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Ignore skip_if checks and run every action
    #[arg(short, long)]
    pub force: bool,

    /// Run even when the workflow requires root and we are not root
    #[arg(long)]
    pub allow_unprivileged: bool,

    /// Show what would run without executing or logging anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `summary` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SummaryArgs {
    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with the number of failed or interrupted steps
    #[arg(long)]
    pub exit_status: bool,
}

/// Arguments for the `install-hook` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallHookArgs {
    /// Where to write the profile script (overrides settings.hook_path)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

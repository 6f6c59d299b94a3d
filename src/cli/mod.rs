//! Command-line interface for reporter.
//!
//! Provides commands for reporting approvals and commit evidence, and for
//! querying environments back from the tracking service.

use std::path::PathBuf;

use anyhow::Result;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{self, Overrides, ResolvedConfig};

pub mod approval;
pub mod commits;
pub mod environment;
pub mod evidence;

/// reporter - report software evidence to a tracking service
#[derive(Parser, Debug)]
#[command(name = "reporter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Tracking service host
    #[arg(long, env = "REPORTER_HOST", global = true)]
    pub host: Option<String>,

    /// Organization name
    #[arg(long, env = "REPORTER_ORG", global = true)]
    pub org: Option<String>,

    /// API token
    #[arg(long, env = "REPORTER_API_TOKEN", global = true, hide_env_values = true)]
    pub api_token: Option<String>,

    /// Maximum number of attempts per API call
    #[arg(long, env = "REPORTER_MAX_ATTEMPTS", global = true)]
    pub max_attempts: Option<u32>,

    /// Log what would be sent instead of sending it
    #[arg(
        long,
        env = "REPORTER_DRY_RUN",
        global = true,
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub dry_run: bool,

    /// Print debug logs
    #[arg(long, global = true)]
    pub debug: bool,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            org: self.org.clone(),
            api_token: self.api_token.clone(),
            max_attempts: self.max_attempts,
            dry_run: self.dry_run,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report or request deployment approvals
    Approval {
        #[command(subcommand)]
        command: approval::ApprovalCommands,
    },

    /// Report evidence
    Evidence {
        #[command(subcommand)]
        command: evidence::EvidenceCommands,
    },

    /// Query environments
    Environment {
        #[command(subcommand)]
        command: environment::EnvironmentCommands,
    },

    /// Inspect local commit ranges
    Commits {
        #[command(subcommand)]
        command: commits::CommitsCommands,
    },
}

/// Commit range flags shared by approval commands
#[derive(Args, Debug, Clone)]
pub struct CommitRangeArgs {
    /// Oldest commit of the range (excluded)
    #[arg(long)]
    pub oldest_commit: String,

    /// Newest commit of the range (included)
    #[arg(long, default_value = crate::git::DEFAULT_NEWEST_REVISION)]
    pub newest_commit: String,

    /// Directory of the source git repository
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,
}

/// Split a comma separated flag value, dropping empty items
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = config::load_config(&self.global.overrides())?;
        self.command.execute(&config).await
    }
}

impl Commands {
    /// Execute against an already resolved configuration
    pub async fn execute(self, config: &ResolvedConfig) -> Result<()> {
        match self {
            Commands::Approval { command } => approval::execute(command, config).await,
            Commands::Evidence { command } => evidence::execute(command, config).await,
            Commands::Environment { command } => environment::execute(command, config).await,
            Commands::Commits { command } => commits::execute(command),
        }
    }
}

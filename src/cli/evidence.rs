//! Evidence subcommands.
//!
//! Evidence is sent as a multipart form: the JSON record in `data_json`
//! plus an optional file (or bundle of files) as supporting material.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use reqwest::Method;
use tracing::{debug, info};

use crate::config::ResolvedConfig;
use crate::delivery::{DeliveryRequest, EvidenceForm};
use crate::domain::{load_user_data, CommitEvidencePayload};
use crate::git::GitView;

use super::split_list;

/// Evidence-related subcommands
#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    /// Report generic evidence for a commit
    Commit(CommitEvidenceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommitEvidenceArgs {
    /// Commit the evidence is about (any revision reference)
    #[arg(long, default_value = crate::git::DEFAULT_NEWEST_REVISION)]
    pub commit: String,

    /// Evidence name
    #[arg(short, long)]
    pub name: String,

    /// Comma separated flows the commit belongs to
    #[arg(short, long, default_value = "")]
    pub flows: String,

    /// URL of the CI build that produced the evidence
    #[arg(short, long)]
    pub build_url: String,

    /// Whether the evidence is compliant
    #[arg(short = 'C', long)]
    pub compliant: bool,

    /// Evidence description
    #[arg(short, long)]
    pub description: Option<String>,

    /// JSON file with extra data to attach
    #[arg(short, long)]
    pub user_data: Option<PathBuf>,

    /// Comma separated files or directories to attach
    #[arg(short, long, default_value = "")]
    pub evidence_paths: String,

    /// Directory of the source git repository
    #[arg(long, default_value = ".")]
    pub repo_root: PathBuf,
}

/// Execute evidence subcommands
pub async fn execute(command: EvidenceCommands, config: &ResolvedConfig) -> Result<()> {
    match command {
        EvidenceCommands::Commit(args) => report_commit_evidence(args, config).await,
    }
}

/// Build the evidence form for `args`, resolving the commit locally
pub fn build_form(args: &CommitEvidenceArgs) -> Result<EvidenceForm> {
    let commit = GitView::open(&args.repo_root)?.commit_info(&args.commit)?;
    debug!(
        commit = %commit.sha1,
        author = %commit.author,
        "evidence commit: {}",
        commit.message.lines().next().unwrap_or_default()
    );

    let payload = CommitEvidencePayload {
        commit_sha1: commit.sha1,
        name: args.name.clone(),
        flows: split_list(&args.flows),
        build_url: args.build_url.clone(),
        is_compliant: args.compliant,
        description: args.description.clone(),
        user_data: load_user_data(args.user_data.as_deref())?,
    };

    let form = split_list(&args.evidence_paths)
        .into_iter()
        .fold(EvidenceForm::new().payload(&payload)?, |form, path| form.attach(path));
    Ok(form)
}

async fn report_commit_evidence(args: CommitEvidenceArgs, config: &ResolvedConfig) -> Result<()> {
    let org = config.require_org()?;
    config.require_api_token()?;

    let form = build_form(&args)?;
    let url = config.api_url(&format!("/api/v2/evidence/{}/commit/generic", org));

    let mut request = DeliveryRequest::form(Method::POST, url, form);
    if let Some(credentials) = config.credentials() {
        request = request.with_credentials(credentials);
    }

    let response = config.delivery_client()?.send(&request).await?;
    if !response.is_dry_run() {
        info!(name = %args.name, "generic evidence is reported to commit: {}", args.commit);
    }
    Ok(())
}

//! Approval subcommands.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use reqwest::Method;
use tracing::{debug, info};

use crate::config::ResolvedConfig;
use crate::delivery::DeliveryRequest;
use crate::domain::{load_user_data, ApprovalPayload};
use crate::git::GitView;

use super::CommitRangeArgs;

#[derive(Subcommand, Debug)]
pub enum ApprovalCommands {
    /// Report that an artifact has been approved for deployment
    Report(ApprovalArgs),

    /// Request an approval of deploying an artifact
    Request(ApprovalArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ApprovalArgs {
    /// Pipeline name
    #[arg(short, long)]
    pub pipeline: String,

    /// SHA256 fingerprint of the artifact
    #[arg(short, long)]
    pub sha256: String,

    /// Approval description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// JSON file with extra data to attach
    #[arg(short, long)]
    pub user_data: Option<PathBuf>,

    #[command(flatten)]
    pub range: CommitRangeArgs,
}

/// Execute approval subcommands
pub async fn execute(command: ApprovalCommands, config: &ResolvedConfig) -> Result<()> {
    match command {
        ApprovalCommands::Report(args) => send_approval(args, config, true).await,
        ApprovalCommands::Request(args) => send_approval(args, config, false).await,
    }
}

/// Build the approval payload for `args`
pub fn build_payload(args: &ApprovalArgs, approved: bool) -> Result<ApprovalPayload> {
    let user_data = load_user_data(args.user_data.as_deref())?;
    let range = &args.range;
    let view = GitView::open(&range.repo_root)?;
    let newest = view.resolve_revision(&range.newest_commit)?;
    let commits = view.commits_between(&range.oldest_commit, &range.newest_commit)?;
    debug!(
        newest = %newest,
        commits = commits.len(),
        "resolved approval commit range"
    );
    let commit_list = commits.into_iter().map(|c| c.sha1).collect();

    let payload = if approved {
        ApprovalPayload::report(&args.sha256, &args.description, commit_list, user_data)
    } else {
        ApprovalPayload::request(&args.sha256, &args.description, commit_list, user_data)
    };
    Ok(payload)
}

async fn send_approval(args: ApprovalArgs, config: &ResolvedConfig, approved: bool) -> Result<()> {
    let org = config.require_org()?;
    config.require_api_token()?;

    let payload = build_payload(&args, approved)?;
    let url = config.api_url(&format!("/api/v1/projects/{}/{}/approvals/", org, args.pipeline));

    let mut request = DeliveryRequest::json(Method::POST, url, &payload)?;
    if let Some(credentials) = config.credentials() {
        request = request.with_credentials(credentials);
    }

    let response = config.delivery_client()?.send(&request).await?;
    if !response.is_dry_run() {
        info!(
            artifact = %args.sha256,
            commits = payload.src_commit_list.len(),
            "approval {} for pipeline {}",
            if approved { "reported" } else { "requested" },
            args.pipeline
        );
    }
    Ok(())
}

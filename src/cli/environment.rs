//! Environment query subcommands.
//!
//! Queries always hit the service, even in dry-run mode.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Subcommand;
use reqwest::Method;

use crate::config::ResolvedConfig;
use crate::delivery::DeliveryRequest;

#[derive(Subcommand, Debug)]
pub enum EnvironmentCommands {
    /// Show an environment's metadata
    Get {
        /// Environment name
        name: String,
    },

    /// List snapshots of an environment
    Log {
        /// Environment name
        name: String,

        /// Page number
        #[arg(long, default_value = "1", allow_hyphen_values = true)]
        page: i64,

        /// Snapshots per page
        #[arg(short, long, default_value = "15", allow_hyphen_values = true)]
        limit: i64,
    },
}

/// Execute environment subcommands
pub async fn execute(command: EnvironmentCommands, config: &ResolvedConfig) -> Result<()> {
    let body = match command {
        EnvironmentCommands::Get { name } => {
            let org = config.require_org()?;
            let url = config.api_url(&format!("/api/v1/environments/{}/{}", org, name));
            query(config, url).await?
        }
        EnvironmentCommands::Log { name, page, limit } => {
            if page <= 0 || limit <= 0 {
                println!("No environment snapshots were requested");
                return Ok(());
            }
            let org = config.require_org()?;
            let url = config.api_url(&format!(
                "/api/v1/environments/{}/{}/snapshots/?page={}&per_page={}",
                org, name, page, limit
            ));
            query(config, url).await?
        }
    };

    print_json(&mut std::io::stdout().lock(), &body)
}

async fn query(config: &ResolvedConfig, url: String) -> Result<String> {
    config.require_api_token()?;

    let mut request = DeliveryRequest::empty(Method::GET, url);
    if let Some(credentials) = config.credentials() {
        request = request.with_credentials(credentials);
    }

    let response = config
        .delivery_client()?
        .with_dry_run(false)
        .send(&request)
        .await?;
    Ok(response.body)
}

/// Pretty print a JSON response body
pub fn print_json(out: &mut impl Write, raw: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("Failed to parse response as JSON")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

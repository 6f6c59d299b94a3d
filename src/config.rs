//! Configuration for reporter.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags
//! 2. Environment variables (REPORTER_HOST, REPORTER_ORG, REPORTER_API_TOKEN,
//!    REPORTER_MAX_ATTEMPTS, REPORTER_DRY_RUN), applied by clap
//! 3. Config file (.reporter/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .reporter/config.yaml
//! - Falls back to ~/.reporter/config.yaml
//!
//! The resolved configuration is built once per invocation and passed to the
//! commands that need it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::delivery::{Credentials, DeliveryClient, HttpTransport, RetryPolicy};

/// Default tracking service host
pub const DEFAULT_HOST: &str = "https://app.kosli.com";

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub host: Option<String>,
    pub org: Option<String>,
    pub api_token: Option<String>,
    #[serde(default)]
    pub http: Option<HttpConfig>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub org: Option<String>,
    pub api_token: Option<String>,
    pub max_attempts: Option<u32>,
    pub dry_run: bool,
}

/// Resolved configuration for one invocation
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Tracking service base URL, without trailing slash
    pub host: String,
    /// Organization the records belong to
    pub org: Option<String>,
    pub api_token: Option<String>,
    pub retry: RetryPolicy,
    pub http_timeout: Duration,
    pub dry_run: bool,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Build a full API URL from a path starting with `/`
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    pub fn require_org(&self) -> Result<&str> {
        self.org
            .as_deref()
            .context("An organization is required: use --org or REPORTER_ORG")
    }

    pub fn require_api_token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .context("An API token is required: use --api-token or REPORTER_API_TOKEN")
    }

    /// Credentials attached to every request.
    ///
    /// The service takes the API token as the password of a basic auth pair
    /// with an empty username.
    pub fn credentials(&self) -> Option<Credentials> {
        self.api_token.clone().map(|token| Credentials::Basic {
            username: String::new(),
            password: token,
        })
    }

    /// Delivery client over HTTP honouring retry and dry-run settings
    pub fn delivery_client(&self) -> Result<DeliveryClient> {
        let transport =
            HttpTransport::new(self.http_timeout).context("Failed to build HTTP client")?;
        Ok(DeliveryClient::new(Arc::new(transport))
            .with_retry_policy(self.retry.clone())
            .with_dry_run(self.dry_run))
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".reporter").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    let home_config = dirs::home_dir()?.join(".reporter").join("config.yaml");
    home_config.exists().then_some(home_config)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge overrides over an optional config file
fn resolve(
    overrides: &Overrides,
    file: ConfigFile,
    config_file: Option<PathBuf>,
) -> ResolvedConfig {
    let host = overrides
        .host
        .clone()
        .or(file.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let mut retry = file.retry.unwrap_or_default();
    if let Some(max_attempts) = overrides.max_attempts {
        retry.max_attempts = max_attempts;
    }
    retry.max_attempts = retry.max_attempts.max(1);

    let timeout_seconds = file
        .http
        .and_then(|h| h.timeout_seconds)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS);

    ResolvedConfig {
        host: host.trim_end_matches('/').to_string(),
        org: overrides.org.clone().or(file.org),
        api_token: overrides.api_token.clone().or(file.api_token),
        retry,
        http_timeout: Duration::from_secs(timeout_seconds),
        dry_run: overrides.dry_run,
        config_file,
    }
}

/// Load configuration from all sources, searching from `start_dir`
pub fn load_config_from(start_dir: &Path, overrides: &Overrides) -> Result<ResolvedConfig> {
    match find_config_file(start_dir) {
        Some(path) => {
            let file = load_config_file(&path)?;
            Ok(resolve(overrides, file, Some(path)))
        }
        None => Ok(resolve(overrides, ConfigFile::default(), None)),
    }
}

/// Load configuration from all sources, searching from the current directory
pub fn load_config(overrides: &Overrides) -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd, overrides)
}

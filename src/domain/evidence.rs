//! Commit evidence payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic evidence attached to a commit in one or more flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitEvidencePayload {
    pub commit_sha1: String,

    /// Evidence name as shown in the service
    pub name: String,

    pub flows: Vec<String>,

    pub build_url: String,

    pub is_compliant: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub user_data: Value,
}

//! Approval payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Review state recorded for an externally reported approval
pub const APPROVED_STATE: &str = "APPROVED";

/// A single review attached to an approval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub state: String,
    pub comment: String,
    pub approved_by: String,
    pub approval_url: String,
}

impl Review {
    /// Review recorded when the approval was granted outside the service
    pub fn external(comment: impl Into<String>) -> Self {
        Self {
            state: APPROVED_STATE.to_string(),
            comment: comment.into(),
            approved_by: "External".to_string(),
            approval_url: "undefined".to_string(),
        }
    }
}

/// Body of an approval report or request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalPayload {
    pub artifact_sha256: String,

    pub description: String,

    /// Commits covered by the approval, newest first
    pub src_commit_list: Vec<String>,

    /// Empty for approval requests
    pub approvals: Vec<Review>,

    pub user_data: Value,
}

impl ApprovalPayload {
    /// An approval that has already been granted
    pub fn report(
        artifact_sha256: impl Into<String>,
        description: impl Into<String>,
        src_commit_list: Vec<String>,
        user_data: Value,
    ) -> Self {
        let description = description.into();
        Self {
            artifact_sha256: artifact_sha256.into(),
            approvals: vec![Review::external(description.clone())],
            description,
            src_commit_list,
            user_data,
        }
    }

    /// An approval that still has to be granted in the service
    pub fn request(
        artifact_sha256: impl Into<String>,
        description: impl Into<String>,
        src_commit_list: Vec<String>,
        user_data: Value,
    ) -> Self {
        Self {
            artifact_sha256: artifact_sha256.into(),
            description: description.into(),
            src_commit_list,
            approvals: Vec::new(),
            user_data,
        }
    }
}

//! reporter - report software evidence to a tracking service
//!
//! A command-line client that reports build, approval and compliance
//! evidence about artifacts, and queries environment state back.
//!
//! # Architecture
//!
//! Every reporting command follows the same path:
//! - Build a command-specific payload (`domain`)
//! - Optionally resolve the commit range it covers (`git`)
//! - Hand the payload to a `DeliveryClient` (`delivery`)
//!
//! # Modules
//!
//! - `git`: Commit range resolution over the local repository
//! - `delivery`: Dry-run, retry and error classification for API calls
//! - `domain`: Payload types (approvals, commit evidence)
//! - `config`: Host, organization, credentials and retry settings
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Report an approval covering the last 5 commits
//! reporter approval report --pipeline backend --sha256 <digest> \
//!     --oldest-commit HEAD~5 --org acme --api-token <token>
//!
//! # See what would be sent
//! reporter --dry-run evidence commit --name tests --build-url <url> \
//!     --evidence-paths reports/
//! ```

pub mod cli;
pub mod config;
pub mod delivery;
pub mod domain;
pub mod git;

// Re-export main types at crate root for convenience
pub use delivery::{
    Credentials, DeliveryClient, DeliveryError, DeliveryRequest, DeliveryResponse, EvidenceForm,
    Outcome, RetryPolicy, Transport,
};
pub use domain::{ApprovalPayload, CommitEvidencePayload};
pub use git::{list_commits_between, CommitInfo, GitError, GitView};

//! Read-only access to the local source repository.
//!
//! Approval and evidence records are scoped to a range of commits. This
//! module resolves revision references and walks history between them.
//!
//! # Example
//!
//! ```ignore
//! use reporter::git::GitView;
//! use std::path::Path;
//!
//! let view = GitView::open(Path::new("."))?;
//! let commits = view.commits_between("HEAD~5", "HEAD")?;
//! ```

pub mod view;

pub use view::{list_commits_between, CommitInfo, GitError, GitView, DEFAULT_NEWEST_REVISION};

//! Commit range resolution over a git repository.

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Sort};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

/// Revision used for the newest end of a range when the caller gives none
pub const DEFAULT_NEWEST_REVISION: &str = "HEAD";

/// Errors raised while reading the repository
#[derive(Debug, Error)]
pub enum GitError {
    #[error("failed to open git repository at {}: {source}", path.display())]
    RepositoryOpen {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("failed to resolve revision '{reference}': {source}")]
    RevisionResolution {
        reference: String,
        #[source]
        source: git2::Error,
    },

    #[error("commit '{oldest}' was not found in the history of '{newest}'")]
    RangeNotFound { oldest: String, newest: String },

    #[error("failed to walk git history: {0}")]
    Walk(#[source] git2::Error),
}

/// A commit as reported in evidence payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// Full hex commit id
    pub sha1: String,

    /// Full commit message
    pub message: String,

    /// Author as `Name <email>`
    pub author: String,

    /// Committer time in Unix seconds
    pub timestamp: i64,

    /// Parent commit ids
    pub parents: Vec<String>,
}

impl CommitInfo {
    fn from_commit(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        Self {
            sha1: commit.id().to_string(),
            message: commit.message().unwrap_or_default().trim_end().to_string(),
            author: format!(
                "{} <{}>",
                author.name().unwrap_or_default(),
                author.email().unwrap_or_default()
            ),
            timestamp: commit.time().seconds(),
            parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        }
    }
}

/// Read-only view over a local repository
pub struct GitView {
    repo: Repository,
}

impl GitView {
    /// Open the repository rooted at `repo_root`.
    ///
    /// Parent directories are not searched.
    pub fn open(repo_root: &Path) -> Result<Self, GitError> {
        let repo = Repository::open(repo_root).map_err(|source| GitError::RepositoryOpen {
            path: repo_root.to_path_buf(),
            source,
        })?;
        Ok(Self { repo })
    }

    fn resolve_oid(&self, reference: &str) -> Result<Oid, GitError> {
        let to_error = |source| GitError::RevisionResolution {
            reference: reference.to_string(),
            source,
        };

        let object = self.repo.revparse_single(reference).map_err(to_error)?;
        let commit = object.peel_to_commit().map_err(to_error)?;
        Ok(commit.id())
    }

    /// Resolve any revision reference to its full commit id
    pub fn resolve_revision(&self, reference: &str) -> Result<String, GitError> {
        Ok(self.resolve_oid(reference)?.to_string())
    }

    /// Look up a single commit
    pub fn commit_info(&self, reference: &str) -> Result<CommitInfo, GitError> {
        let oid = self.resolve_oid(reference)?;
        let commit = self.repo.find_commit(oid).map_err(GitError::Walk)?;
        Ok(CommitInfo::from_commit(&commit))
    }

    /// List the commits after `oldest` up to and including `newest`.
    ///
    /// History is walked from `newest` in committer-time order and stops when
    /// `oldest` is reached; `oldest` itself is never part of the result.
    #[instrument(skip(self))]
    pub fn commits_between(&self, oldest: &str, newest: &str) -> Result<Vec<CommitInfo>, GitError> {
        // Both ends must resolve before the walk starts.
        let newest_oid = self.resolve_oid(newest)?;
        let oldest_oid = self.resolve_oid(oldest)?;
        debug!(newest = %newest_oid, oldest = %oldest_oid, "resolved commit range");

        let mut walk = self.repo.revwalk().map_err(GitError::Walk)?;
        walk.set_sorting(Sort::TIME).map_err(GitError::Walk)?;
        walk.push(newest_oid).map_err(GitError::Walk)?;

        let mut commits = Vec::new();
        for oid in walk {
            let oid = oid.map_err(GitError::Walk)?;
            if oid == oldest_oid {
                debug!(count = commits.len(), "reached oldest commit");
                return Ok(commits);
            }

            let commit = self.repo.find_commit(oid).map_err(GitError::Walk)?;
            commits.push(CommitInfo::from_commit(&commit));
        }

        Err(GitError::RangeNotFound {
            oldest: oldest.to_string(),
            newest: newest.to_string(),
        })
    }
}

/// Open `repo_root` and list the commits between two revisions
pub fn list_commits_between(
    repo_root: &Path,
    oldest: &str,
    newest: &str,
) -> Result<Vec<CommitInfo>, GitError> {
    GitView::open(repo_root)?.commits_between(oldest, newest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Signature, Time};
    use tempfile::TempDir;

    fn commit_at(repo: &Repository, message: &str, seconds: i64) -> Oid {
        let sig = Signature::new("Test", "test@example.com", &Time::new(seconds, 0)).unwrap();
        let tree_id = repo.index().unwrap().write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    #[test]
    fn test_resolve_revision_accepts_relative_refs() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        let first = commit_at(&repo, "first", 1_000);
        let second = commit_at(&repo, "second", 2_000);

        let view = GitView::open(temp.path()).unwrap();
        assert_eq!(view.resolve_revision("HEAD").unwrap(), second.to_string());
        assert_eq!(view.resolve_revision("HEAD~1").unwrap(), first.to_string());
        assert_eq!(
            view.resolve_revision(&first.to_string()[..10]).unwrap(),
            first.to_string()
        );
    }

    #[test]
    fn test_commit_info_fields() {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        let first = commit_at(&repo, "first\n", 1_000);
        let second = commit_at(&repo, "second", 2_000);

        let view = GitView::open(temp.path()).unwrap();
        let info = view.commit_info("HEAD").unwrap();
        assert_eq!(info.sha1, second.to_string());
        assert_eq!(info.message, "second");
        assert_eq!(info.author, "Test <test@example.com>");
        assert_eq!(info.timestamp, 2_000);
        assert_eq!(info.parents, vec![first.to_string()]);

        let root = view.commit_info("HEAD~1").unwrap();
        assert_eq!(root.message, "first");
        assert!(root.parents.is_empty());
    }

    #[test]
    fn test_open_missing_repository() {
        let temp = TempDir::new().unwrap();
        let result = GitView::open(temp.path());
        assert!(matches!(result, Err(GitError::RepositoryOpen { .. })));
    }
}

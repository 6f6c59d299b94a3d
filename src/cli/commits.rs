//! Local commit range inspection.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;

use crate::git::{list_commits_between, CommitInfo, DEFAULT_NEWEST_REVISION};

#[derive(Subcommand, Debug)]
pub enum CommitsCommands {
    /// List the commits an approval between two revisions would cover
    List {
        /// Oldest commit of the range (excluded)
        #[arg(long)]
        oldest: String,

        /// Newest commit of the range (included)
        #[arg(long, default_value = DEFAULT_NEWEST_REVISION)]
        newest: String,

        /// Directory of the source git repository
        #[arg(long, default_value = ".")]
        repo_root: PathBuf,

        /// Print as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Execute commit subcommands
pub fn execute(command: CommitsCommands) -> Result<()> {
    match command {
        CommitsCommands::List {
            oldest,
            newest,
            repo_root,
            json,
        } => {
            let commits = list_commits_between(&repo_root, &oldest, &newest)?;
            let mut out = std::io::stdout().lock();
            write_commits(&mut out, &commits, json)
        }
    }
}

/// Print one line per commit (short id, commit date, summary), or the full
/// list as JSON
pub fn write_commits(out: &mut impl Write, commits: &[CommitInfo], json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(commits)?)?;
        return Ok(());
    }

    if commits.is_empty() {
        writeln!(out, "No commits in range")?;
    }
    for commit in commits {
        let summary = commit.message.lines().next().unwrap_or_default();
        let date = DateTime::<Utc>::from_timestamp(commit.timestamp, 0)
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        writeln!(out, "{} {} {}", &commit.sha1[..8], date, summary)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(sha1: &str, message: &str) -> CommitInfo {
        CommitInfo {
            sha1: sha1.to_string(),
            message: message.to_string(),
            author: "Test <test@example.com>".to_string(),
            timestamp: 0,
            parents: Vec::new(),
        }
    }

    #[test]
    fn test_write_commits_short_form() {
        let commits = vec![
            commit("0123456789abcdef0123456789abcdef01234567", "fix: retry\n\nbody"),
            commit("89abcdef0123456789abcdef0123456789abcdef", "feat: walk"),
        ];

        let mut out = Vec::new();
        write_commits(&mut out, &commits, false).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "01234567 1970-01-01 fix: retry\n89abcdef 1970-01-01 feat: walk\n"
        );
    }

    #[test]
    fn test_write_commits_empty_range() {
        let mut out = Vec::new();
        write_commits(&mut out, &[], false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No commits in range\n");
    }
}

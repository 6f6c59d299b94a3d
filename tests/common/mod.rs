//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::path::Path;

use git2::{Commit, Oid, Repository, Signature, Time};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A throwaway git repository with commits at chosen committer times
pub struct GitFixture {
    pub dir: TempDir,
    pub repo: Repository,
}

impl GitFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commit on top of HEAD and move HEAD forward
    pub fn commit(&self, message: &str, seconds: i64) -> Oid {
        let parents: Vec<Oid> = self
            .repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .into_iter()
            .collect();
        self.commit_with_parents(Some("HEAD"), message, seconds, &parents)
    }

    /// Commit with explicit parents, optionally updating a reference
    pub fn commit_with_parents(
        &self,
        update_ref: Option<&str>,
        message: &str,
        seconds: i64,
        parents: &[Oid],
    ) -> Oid {
        let sig = Signature::new("Test", "test@example.com", &Time::new(seconds, 0)).unwrap();
        let tree_id = self.repo.index().unwrap().write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let parents: Vec<Commit<'_>> = parents
            .iter()
            .map(|id| self.repo.find_commit(*id).unwrap())
            .collect();
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();

        self.repo
            .commit(update_ref, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    /// Create a branch pointing at `target`
    pub fn branch(&self, name: &str, target: Oid) {
        let commit = self.repo.find_commit(target).unwrap();
        self.repo.branch(name, &commit, false).unwrap();
    }

    /// Linear history of `count` commits, one minute apart, oldest first
    pub fn linear(count: usize) -> (Self, Vec<Oid>) {
        let fixture = Self::new();
        let ids = (0..count)
            .map(|i| fixture.commit(&format!("commit {}", i), 1_700_000_000 + 60 * i as i64))
            .collect();
        (fixture, ids)
    }
}

pub fn ids(commits: &[reporter::CommitInfo]) -> Vec<String> {
    commits.iter().map(|c| c.sha1.clone()).collect()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn content_length(head: &str) -> Option<usize> {
    head.lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse().ok())
}

/// Read one full HTTP request (head and body) from the stream
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let complete = match content_length(&head) {
                Some(length) => buf.len() >= end + 4 + length,
                None if head.contains("transfer-encoding: chunked") => {
                    buf.ends_with(b"0\r\n\r\n")
                }
                None => true,
            };
            if complete {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

/// Serve one scripted response per connection and return what was received
pub async fn spawn_server(
    responses: Vec<(u16, &'static str)>,
) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut received = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            received.push(read_request(&mut stream).await);

            let reply = format!(
                "HTTP/1.1 {} Scripted\r\n\
                 content-type: application/json\r\n\
                 content-length: {}\r\n\
                 connection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
        received
    });

    (base_url, handle)
}

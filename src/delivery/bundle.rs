//! Attachment preparation for multipart evidence.
//!
//! A single regular file is uploaded as-is. Directories and multiple paths
//! are packed into one tar archive inside a scratch directory that lives only
//! as long as the [`PreparedAttachment`] holding it.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use super::error::DeliveryError;

/// File name of the archive built for multi-path evidence
pub const BUNDLE_FILE_NAME: &str = "evidence_files_bundle.tar";

/// The file that will be streamed as the evidence part
#[derive(Debug)]
pub(crate) struct PreparedAttachment {
    path: PathBuf,
    // Removed from disk on drop.
    scratch: Option<TempDir>,
}

impl PreparedAttachment {
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn is_bundle(&self) -> bool {
        self.scratch.is_some()
    }
}

fn attachment_error(path: &Path) -> impl Fn(std::io::Error) -> DeliveryError + '_ {
    move |source| DeliveryError::Attachment {
        path: path.to_path_buf(),
        source,
    }
}

/// Top-level name used for a path inside the archive.
///
/// Paths sharing a base name get a numeric prefix (`1_report.xml`) so no
/// entry shadows another on extraction.
fn archive_name(path: &Path, taken: &mut HashSet<PathBuf>) -> PathBuf {
    let base = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("evidence"));

    let mut name = base.clone();
    let mut suffix = 1;
    while !taken.insert(name.clone()) {
        name = PathBuf::from(format!("{}_{}", suffix, base.display()));
        suffix += 1;
    }
    name
}

/// Validate attachment paths and bundle them when needed.
///
/// `scratch_root` selects where the temporary bundle directory is created;
/// the system temp dir is used when it is `None`.
pub(crate) fn prepare(
    paths: &[PathBuf],
    scratch_root: Option<&Path>,
) -> Result<Option<PreparedAttachment>, DeliveryError> {
    if paths.is_empty() {
        return Ok(None);
    }

    for path in paths {
        std::fs::metadata(path).map_err(attachment_error(path))?;
    }

    if let [single] = paths {
        if single.is_file() {
            return Ok(Some(PreparedAttachment {
                path: single.clone(),
                scratch: None,
            }));
        }
    }

    let mut builder = tempfile::Builder::new();
    builder.prefix("evidence-");
    let scratch = match scratch_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(attachment_error(scratch_root.unwrap_or(Path::new("."))))?;

    let bundle_path = scratch.path().join(BUNDLE_FILE_NAME);
    let file = File::create(&bundle_path).map_err(attachment_error(&bundle_path))?;
    let mut archive = tar::Builder::new(file);

    let mut taken = HashSet::new();
    for path in paths {
        let name = archive_name(path, &mut taken);
        if path.is_dir() {
            archive
                .append_dir_all(&name, path)
                .map_err(attachment_error(path))?;
        } else {
            archive
                .append_path_with_name(path, &name)
                .map_err(attachment_error(path))?;
        }
    }

    archive
        .into_inner()
        .map_err(attachment_error(&bundle_path))?;

    debug!(bundle = %bundle_path.display(), entries = paths.len(), "bundled evidence attachments");

    Ok(Some(PreparedAttachment {
        path: bundle_path,
        scratch: Some(scratch),
    }))
}

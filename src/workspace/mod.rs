// src/workspace/mod.rs
// =============================================================================
// Per-job directory trees.
//
// Layout under the storage root:
//
//   storage/
//     task_<job id>/
//       html/  css/  js/  media/
//
// Directory names come from the job id, so two jobs never share a tree.
// Nothing here deletes a workspace; cleanup is left to whoever owns storage.
// =============================================================================

use crate::error::MirrorError;
use crate::job::JobId;
use crate::resource::ResourceKind;
use std::path::{Path, PathBuf};

/// The four fixed subdirectories every workspace gets.
pub const SUBDIRECTORIES: [&str; 4] = ["html", "css", "js", "media"];

/// A job's directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    storage_root: PathBuf,
    name: String,
}

impl Workspace {
    /// `task_<id>`, the directory name and the archive's top-level entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn root(&self) -> PathBuf {
        self.storage_root.join(&self.name)
    }

    /// Subdirectory a resource of `kind` is written to.
    pub fn dir_for(&self, kind: &ResourceKind) -> PathBuf {
        self.root().join(kind.label())
    }
}

/// Creates `<storage_root>/task_<id>` and its four subdirectories.
///
/// Safe to call again for the same job: existing directories are kept.
/// Any other failure (permissions, full disk) is returned as
/// `MirrorError::Io` and ends the job.
pub async fn create_workspace(storage_root: &Path, job_id: &JobId) -> Result<Workspace, MirrorError> {
    let workspace = Workspace {
        storage_root: storage_root.to_path_buf(),
        name: format!("task_{}", job_id),
    };

    let root = workspace.root();
    for sub in SUBDIRECTORIES {
        let dir = root.join(sub);
        // create_dir_all already succeeds when the directory exists
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| MirrorError::io(&dir, e))?;
    }

    tracing::debug!(workspace = %root.display(), "Workspace ready");
    Ok(workspace)
}

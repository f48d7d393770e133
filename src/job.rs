// src/job.rs
// =============================================================================
// One mirror request, from submission to finished archive.
//
// Lifecycle:
//
//   Created -> InProgress{level: 1} -> ... -> InProgress{level: depth} -> Completed
//                       \_______________________________________________/-> Failed
//
// A job fails only when its workspace or archive can't be written (which
// can happen before level 1 starts). Pages and assets that can't be
// downloaded are skipped and the job still completes.
//
// Rust concepts:
// - Newtype (JobId): a Uuid that can't be mixed up with other ids
// - #[serde(tag = "state")]: enum variants serialize as {"state": ...}
// - spawn_blocking: runs the synchronous zip code on a blocking thread
// =============================================================================

use crate::archive::archive_workspace;
use crate::config::MirrorConfig;
use crate::crawl::{LevelCrawler, LevelSummary};
use crate::error::MirrorError;
use crate::fetch::Fetcher;
use crate::resource::ResourceWriter;
use crate::workspace::{create_workspace, Workspace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;
use uuid::Uuid;

/// Unique job identifier; names the workspace and the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    InProgress { level: u32 },
    Completed,
    Failed,
}

/// A crawl job and its mutable state.
#[derive(Debug)]
pub struct CrawlJob {
    id: JobId,
    root_url: Url,
    depth: u32,
    status: JobStatus,
    workspace: Option<Workspace>,
    archive_path: Option<PathBuf>,
    levels: Vec<LevelSummary>,
}

impl CrawlJob {
    /// `depth` below 1 is raised to 1.
    pub fn new(root_url: Url, depth: u32) -> Self {
        Self {
            id: JobId::new(),
            root_url,
            depth: depth.max(1),
            status: JobStatus::Created,
            workspace: None,
            archive_path: None,
            levels: Vec::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    /// Crawls, archives, and records the outcome in `status`.
    pub async fn run(&mut self, config: &MirrorConfig) -> Result<PathBuf, MirrorError> {
        self.run_with_progress(config, |_| {}).await
    }

    /// Same as `run`, calling `on_status` with every status the job moves
    /// through after `Created`: one `InProgress` per level, then `Completed`
    /// or `Failed`.
    pub async fn run_with_progress(
        &mut self,
        config: &MirrorConfig,
        mut on_status: impl FnMut(JobStatus),
    ) -> Result<PathBuf, MirrorError> {
        let result = self.execute(config, &mut on_status).await;

        // Whatever happened, the job ends in exactly one terminal state
        self.status = if result.is_ok() {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        on_status(self.status);

        match result {
            Ok(archive_path) => {
                self.archive_path = Some(archive_path.clone());
                tracing::info!(job = %self.id, archive = %archive_path.display(), "Job completed");
                Ok(archive_path)
            }
            Err(e) => {
                tracing::error!(job = %self.id, error = %e, "Job failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &mut self,
        config: &MirrorConfig,
        on_status: &mut impl FnMut(JobStatus),
    ) -> Result<PathBuf, MirrorError> {
        // A workspace failure ends the job before any request is sent
        let workspace = create_workspace(&config.storage_root, &self.id).await?;
        self.workspace = Some(workspace.clone());

        let fetcher = Fetcher::new(config)?;
        // The writer owns this job's external_<kind>_<n> counter
        let mut writer = ResourceWriter::new(workspace.clone());

        tracing::info!(
            job = %self.id,
            url = %self.root_url,
            depth = self.depth,
            workspace = %workspace.root().display(),
            "Job started"
        );

        // Borrow only the status field, so root_url can be borrowed alongside
        let status = &mut self.status;
        self.levels = LevelCrawler::new(&fetcher, &mut writer, &self.root_url, config)
            .run(self.depth, |level| {
                *status = JobStatus::InProgress { level };
                on_status(*status);
            })
            .await;

        // zip writing is blocking I/O; keep it off the async worker threads.
        // The first ? is a JoinError (panic), the second the archive result.
        let archive_path = tokio::task::spawn_blocking(move || archive_workspace(&workspace)).await??;
        Ok(archive_path)
    }

    /// Snapshot of the job for the caller.
    pub fn handle(&self) -> JobHandle {
        JobHandle {
            id: self.id,
            root_url: self.root_url.to_string(),
            depth: self.depth,
            status: self.status,
            workspace: self.workspace.as_ref().map(Workspace::root),
            archive_path: self.archive_path.clone(),
            levels: self.levels.clone(),
        }
    }
}

/// What the caller gets back for a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: JobId,
    pub root_url: String,
    pub depth: u32,
    pub status: JobStatus,
    pub workspace: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive_path: Option<PathBuf>,
    pub levels: Vec<LevelSummary>,
}

impl JobHandle {
    /// The finished archive. None unless the job completed.
    pub fn archive_path(&self) -> Option<&Path> {
        match self.status {
            JobStatus::Completed => self.archive_path.as_deref(),
            _ => None,
        }
    }
}

/// Runs a mirror job to completion.
///
/// The caller is expected to have checked that `root_url` is reachable and
/// `depth >= 1`. Returns the completed job, or the failure that stopped it.
pub async fn submit_job(config: &MirrorConfig, root_url: &str, depth: u32) -> Result<JobHandle, MirrorError> {
    let url = Url::parse(root_url).map_err(|source| MirrorError::InvalidUrl {
        url: root_url.to_string(),
        source,
    })?;

    let mut job = CrawlJob::new(url, depth);
    job.run(config).await?;
    Ok(job.handle())
}

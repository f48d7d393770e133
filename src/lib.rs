// src/lib.rs
// =============================================================================
// site-mirror: mirror a website to disk for a bounded number of link levels
// and pack the result into one zip archive.
//
// Entry point for callers is `job::submit_job`. The binary in main.rs is a
// thin CLI on top of it.
// =============================================================================

pub mod archive;
pub mod config;
pub mod crawl;
pub mod error;
pub mod fetch;
pub mod job;
pub mod resource;
pub mod workspace;

pub use config::MirrorConfig;
pub use error::{FetchError, FetchErrorKind, MirrorError};
pub use job::{submit_job, CrawlJob, JobHandle, JobId, JobStatus};

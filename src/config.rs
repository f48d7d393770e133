// src/config.rs
// =============================================================================
// Runtime settings for a mirror job.
//
// The CLI builds one MirrorConfig from its flags and hands it to submit_job.
// Tests build their own with the with_* methods.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings shared by every job started with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Directory holding one `task_<id>/` workspace (and its zip) per job.
    pub storage_root: PathBuf,
    /// Skip pages whose URL was already fetched earlier in the same job.
    /// Off by default: pages linked more than once are fetched again.
    pub track_visited: bool,
    /// Frontier pages downloaded at the same time.
    pub page_concurrency: usize,
    /// Assets of one page downloaded at the same time.
    pub asset_concurrency: usize,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage"),
            track_visited: false,
            page_concurrency: 4,
            asset_concurrency: 8,
            request_timeout: Duration::from_secs(30),
            user_agent: format!("site-mirror/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl MirrorConfig {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            ..Self::default()
        }
    }

    pub fn with_visited_tracking(mut self, enabled: bool) -> Self {
        self.track_visited = enabled;
        self
    }

    /// Zero is treated as one.
    pub fn with_page_concurrency(mut self, limit: usize) -> Self {
        self.page_concurrency = limit.max(1);
        self
    }

    /// Zero is treated as one.
    pub fn with_asset_concurrency(mut self, limit: usize) -> Self {
        self.asset_concurrency = limit.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The CLI is the caller of the mirror: it accepts a URL and a depth,
// validates them, and turns the flags into a MirrorConfig.
// =============================================================================

use clap::{Parser, Subcommand};
use site_mirror::MirrorConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "site-mirror",
    version,
    about = "Mirror a website's pages, styles, scripts and images into a zip archive",
    long_about = "site-mirror downloads a page, saves its HTML, CSS, JavaScript and images, \
                  follows its links for a number of levels, and packs everything it saved \
                  into a single zip file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mirror a website into a zip archive
    ///
    /// Example: site-mirror mirror https://example.com --depth 2
    Mirror {
        /// Root URL to start from. `http://` is assumed when no scheme is given.
        url: String,

        /// Number of link levels to crawl
        ///
        /// Depth 1 = just the starting page
        /// Depth 2 = starting page + every page it links to
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        depth: u32,

        /// Directory holding one task_<id>/ workspace and zip per job
        #[arg(long, env = "SITE_MIRROR_STORAGE", default_value = "storage")]
        storage_dir: PathBuf,

        /// Don't fetch a page again if it was already fetched in this job
        #[arg(long)]
        skip_visited: bool,

        /// Pages downloaded at the same time within a level
        #[arg(long, default_value_t = 4)]
        page_concurrency: usize,

        /// Assets of a page downloaded at the same time
        #[arg(long, default_value_t = 8)]
        asset_concurrency: usize,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,

        /// User-Agent header sent with every request
        #[arg(long)]
        user_agent: Option<String>,

        /// Print the job report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

/// Adds `http://` to URLs typed without a scheme.
pub fn normalize_root_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

/// Builds the job configuration from the `mirror` flags.
pub fn mirror_config(
    storage_dir: PathBuf,
    skip_visited: bool,
    page_concurrency: usize,
    asset_concurrency: usize,
    timeout_secs: u64,
    user_agent: Option<String>,
) -> MirrorConfig {
    let config = MirrorConfig::new(storage_dir)
        .with_visited_tracking(skip_visited)
        .with_page_concurrency(page_concurrency)
        .with_asset_concurrency(asset_concurrency)
        .with_timeout(Duration::from_secs(timeout_secs));

    match user_agent {
        Some(ua) => config.with_user_agent(ua),
        None => config,
    }
}

// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG)
// 2. Parse command-line arguments using clap
// 3. Submit one mirror job and wait for it
// 4. Print where the archive is and exit (0 = archive ready, 2 = job failed)
// =============================================================================

mod cli;           // src/cli.rs - command-line parsing

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use site_mirror::{JobHandle, MirrorConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "site_mirror=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Mirror {
            url,
            depth,
            storage_dir,
            skip_visited,
            page_concurrency,
            asset_concurrency,
            timeout_secs,
            user_agent,
            json,
        } => {
            let config = cli::mirror_config(
                storage_dir,
                skip_visited,
                page_concurrency,
                asset_concurrency,
                timeout_secs,
                user_agent,
            );
            handle_mirror(&cli::normalize_root_url(&url), depth, &config, json).await
        }
    }
}

// Handles the 'mirror' subcommand
async fn handle_mirror(url: &str, depth: u32, config: &MirrorConfig, json: bool) -> Result<i32> {
    if !json {
        println!("🌐 Mirroring: {}", url);
        println!("📊 Depth: {}", depth);
    }

    let handle = site_mirror::submit_job(config, url, depth)
        .await
        .with_context(|| format!("mirror job for {} failed", url))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&handle)?);
    } else {
        print_summary(&handle);
    }

    Ok(0)
}

fn print_summary(handle: &JobHandle) {
    println!("🆔 Job: {}", handle.id);
    for level in &handle.levels {
        println!(
            "   level {}: {} page(s) fetched of {} requested, {} link(s) found",
            level.level, level.pages_fetched, level.pages_requested, level.links_found
        );
        // Fetched but not written to disk (their links were still followed)
        if level.pages_unsaved > 0 {
            println!("   ⚠️  {} page(s) could not be saved", level.pages_unsaved);
        }
    }

    if let Some(path) = handle.archive_path() {
        println!("📦 Archive: {}", path.display());
    }
}

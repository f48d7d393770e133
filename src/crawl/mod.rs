// src/crawl/mod.rs
// =============================================================================
// This module handles crawling a site for mirroring.
//
// Features:
// - Level-synchronized breadth-first crawl up to a requested depth
// - Every page's HTML, stylesheets, scripts and images saved to the workspace
// - Anchors collected (without deduplication) as the next level's frontier
// - Optional visited set to avoid refetching pages
//
// Submodules:
// - page: fetch one page, save it and its assets, return its links
// - levels: the traversal loop across levels
// =============================================================================

mod levels;
mod page;

pub use levels::{LevelCrawler, LevelSummary};
pub use page::{scan_page, PageParser, PageScan, ProcessedPage};

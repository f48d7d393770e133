// src/crawl/levels.rs
// =============================================================================
// Level-by-level (breadth-first) traversal.
//
// How it works:
// 1. Level 1 is the root URL alone
// 2. Every URL in the current frontier is fetched and processed
// 3. The links returned by those pages, concatenated in frontier order and
//    with duplicates kept, become the next frontier
// 4. Stop after `depth` levels; links found on the last level are dropped
//
// A level is finished before the next one starts. Pages inside a level are
// downloaded a few at a time but processed in frontier order, so the files
// written (and the external_<kind>_<n> numbering) match a one-page-at-a-time
// crawl.
//
// All page downloads of a level complete before the first page is processed.
// Processing a page (saving it, downloading its assets) can take longer than
// a request timeout, and requests left waiting meanwhile would time out.
//
// Revisits: by default a page linked from several places is fetched and
// saved again every time it shows up. With `track_visited` the crawler keeps
// a per-job set of URLs (fragment removed) and skips repeats.
//
// Rust concepts:
// - Option<HashSet>: the visited set exists only when it is switched on
// - FnMut callback: lets the job update its status as each level starts
// - Ownership: each level consumes its frontier and returns the next one
// =============================================================================

use super::page::PageParser;
use crate::config::MirrorConfig;
use crate::fetch::{BodyKind, Fetcher};
use crate::resource::ResourceWriter;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// What happened on one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: u32,
    /// Frontier entries dispatched for fetching.
    pub pages_requested: usize,
    /// Frontier entries skipped because they were already visited.
    pub pages_skipped: usize,
    pub pages_fetched: usize,
    /// Fetched pages whose HTML could not be written. Their assets and
    /// links are still processed.
    pub pages_unsaved: usize,
    /// Size of the frontier this level produced for the next one.
    pub links_found: usize,
}

/// Drives a job's crawl across levels.
pub struct LevelCrawler<'a> {
    fetcher: &'a Fetcher,
    writer: &'a mut ResourceWriter,
    root_url: &'a Url,
    page_concurrency: usize,
    asset_concurrency: usize,
    visited: Option<HashSet<String>>,
}

impl<'a> LevelCrawler<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        writer: &'a mut ResourceWriter,
        root_url: &'a Url,
        config: &MirrorConfig,
    ) -> Self {
        Self {
            fetcher,
            writer,
            root_url,
            page_concurrency: config.page_concurrency.max(1),
            asset_concurrency: config.asset_concurrency.max(1),
            visited: config.track_visited.then(HashSet::new),
        }
    }

    /// Crawls levels 1 through `depth`. `on_level` is called as each level
    /// starts.
    pub async fn run(&mut self, depth: u32, mut on_level: impl FnMut(u32)) -> Vec<LevelSummary> {
        let mut summaries = Vec::new();
        let mut frontier = vec![self.root_url.to_string()];

        for level in 1..=depth.max(1) {
            on_level(level);
            tracing::info!(
                level,
                depth,
                frontier = frontier.len(),
                "Processing level"
            );

            let (summary, next) = self.crawl_level(level, frontier).await;
            summaries.push(summary);
            frontier = next;
        }

        tracing::debug!(unvisited = frontier.len(), "Depth reached, dropping remaining frontier");
        summaries
    }

    /// Visits every URL in `frontier` and returns the next frontier.
    pub async fn crawl_level(&mut self, level: u32, frontier: Vec<String>) -> (LevelSummary, Vec<String>) {
        let total = frontier.len();

        // Drop repeats before anything is fetched (no-op unless tracking)
        let to_visit: Vec<String> = frontier
            .into_iter()
            .filter(|url| self.should_visit(url))
            .collect();

        let mut summary = LevelSummary {
            level,
            pages_requested: to_visit.len(),
            pages_skipped: total - to_visit.len(),
            pages_fetched: 0,
            pages_unsaved: 0,
            links_found: 0,
        };

        // Step 1: download every page of the level, up to page_concurrency
        // at once. .buffered() keeps the results in frontier order.
        let fetcher = self.fetcher;
        let pages: Vec<_> = stream::iter(&to_visit)
            .map(|url| async move { (url, fetcher.fetch_str(url, BodyKind::Text).await) })
            .buffered(self.page_concurrency)
            .collect()
            .await;

        // Step 2: save each page and its assets, strictly one page at a time,
        // so file names come out the same as in a sequential crawl
        let mut parser = PageParser::new(fetcher, &mut *self.writer, self.root_url, self.asset_concurrency);
        let mut next = Vec::new();

        for (url, fetched) in pages {
            match fetched {
                Ok(page) => {
                    summary.pages_fetched += 1;
                    let processed = parser.process_page(page).await;
                    if processed.html_path.is_none() {
                        summary.pages_unsaved += 1;
                    }
                    next.extend(processed.links);
                }
                Err(e) => {
                    // The page adds nothing to the next frontier; the job goes on
                    tracing::warn!(url = %url, error = %e, "Skipping page");
                }
            }
        }

        summary.links_found = next.len();
        (summary, next)
    }

    fn should_visit(&mut self, url: &str) -> bool {
        match self.visited.as_mut() {
            Some(visited) => visited.insert(normalize_url(url)),
            None => true,
        }
    }
}

// Key used by the visited set: the URL without its fragment.
fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.to_string(),
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why buffered() and not buffer_unordered()?
//    - buffer_unordered yields whichever page finishes first
//    - buffered keeps up to N requests in flight but yields in input order
//    - Frontier order decides file names and the next frontier, so it must hold
//
// 2. Why collect the pages before processing them?
//    - A stream only makes progress while someone polls it
//    - Awaiting process_page() between .next() calls would leave the
//      requests already sent sitting idle while their timeout runs out
//    - Collecting first keeps every in-flight request polled to completion
//
// 3. Why is the visited set an Option?
//    - None = baseline behaviour, every frontier entry is fetched
//    - Some(set) = `track_visited`; HashSet::insert returns false on repeats
//
// 4. Why does crawl_level take the frontier by value?
//    - The level consumes it and hands back a fresh Vec for the next level
//    - No frontier outlives the level that produced its successor
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobId;
    use crate::workspace::{create_workspace, Workspace};
    use mockito::{Mock, ServerGuard};

    async fn page(server: &mut ServerGuard, path: &str, html: &str, hits: usize) -> Mock {
        server
            .mock("GET", path)
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(html)
            .expect(hits)
            .create_async()
            .await
    }

    async fn setup(storage: &std::path::Path) -> (Workspace, ResourceWriter, Fetcher) {
        let workspace = create_workspace(storage, &JobId::new()).await.unwrap();
        let writer = ResourceWriter::new(workspace.clone());
        let fetcher = Fetcher::new(&MirrorConfig::default()).unwrap();
        (workspace, writer, fetcher)
    }

    #[test]
    fn test_normalize_drops_fragment() {
        assert_eq!(normalize_url("https://example.com/a#top"), "https://example.com/a");
        assert_eq!(normalize_url("not a url"), "not a url");
    }

    #[tokio::test]
    async fn test_depth_one_visits_only_root() {
        let mut server = mockito::Server::new_async().await;
        let root_mock = page(&mut server, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#, 1).await;
        let a = page(&mut server, "/a", "", 0).await;
        let b = page(&mut server, "/b", "", 0).await;

        let storage = tempfile::tempdir().unwrap();
        let (_workspace, mut writer, fetcher) = setup(storage.path()).await;
        let root = Url::parse(&format!("{}/", server.url())).unwrap();
        let config = MirrorConfig::default();

        let mut levels_started = Vec::new();
        let summaries = LevelCrawler::new(&fetcher, &mut writer, &root, &config)
            .run(1, |level| levels_started.push(level))
            .await;

        assert_eq!(levels_started, vec![1]);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].pages_fetched, 1);
        assert_eq!(summaries[0].links_found, 2);
        root_mock.assert_async().await;
        a.assert_async().await;
        b.assert_async().await;
    }

    #[tokio::test]
    async fn test_depth_two_stops_after_second_level() {
        let mut server = mockito::Server::new_async().await;
        let root_mock = page(&mut server, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#, 1).await;
        let a = page(&mut server, "/a", r#"<a href="/c">c</a>"#, 1).await;
        let b = page(&mut server, "/b", r#"<a href="/d">d</a>"#, 1).await;
        let c = page(&mut server, "/c", "", 0).await;
        let d = page(&mut server, "/d", "", 0).await;

        let storage = tempfile::tempdir().unwrap();
        let (workspace, mut writer, fetcher) = setup(storage.path()).await;
        let root = Url::parse(&format!("{}/", server.url())).unwrap();
        let config = MirrorConfig::default();

        let summaries = LevelCrawler::new(&fetcher, &mut writer, &root, &config)
            .run(2, |_| {})
            .await;

        assert_eq!(summaries.iter().map(|s| s.pages_fetched).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(summaries[1].links_found, 2);
        assert_eq!(std::fs::read_dir(workspace.root().join("html")).unwrap().count(), 3);
        for mock in [root_mock, a, b, c, d] {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_next_frontier_is_ordered_concatenation() {
        let mut server = mockito::Server::new_async().await;
        let _a = page(&mut server, "/a", r#"<a href="/x">x</a><a href="/y">y</a>"#, 1).await;
        let _b = page(&mut server, "/b", r#"<a href="/y">y</a>"#, 1).await;

        let storage = tempfile::tempdir().unwrap();
        let (_workspace, mut writer, fetcher) = setup(storage.path()).await;
        let root = Url::parse(&format!("{}/", server.url())).unwrap();
        let config = MirrorConfig::default().with_page_concurrency(8);
        let frontier = vec![root.join("/a").unwrap().to_string(), root.join("/b").unwrap().to_string()];

        let (summary, next) = LevelCrawler::new(&fetcher, &mut writer, &root, &config)
            .crawl_level(2, frontier)
            .await;

        let expected: Vec<String> = ["/x", "/y", "/y"]
            .iter()
            .map(|p| root.join(p).unwrap().to_string())
            .collect();
        assert_eq!(next, expected);
        assert_eq!(summary.pages_requested, 2);
    }

    #[tokio::test]
    async fn test_repeated_links_are_refetched_by_default() {
        let mut server = mockito::Server::new_async().await;
        let _root = page(&mut server, "/", r#"<a href="/a">1</a><a href="/a">2</a>"#, 1).await;
        let a = page(&mut server, "/a", "<p>a</p>", 2).await;

        let storage = tempfile::tempdir().unwrap();
        let (_workspace, mut writer, fetcher) = setup(storage.path()).await;
        let root = Url::parse(&format!("{}/", server.url())).unwrap();
        let config = MirrorConfig::default();

        let summaries = LevelCrawler::new(&fetcher, &mut writer, &root, &config)
            .run(2, |_| {})
            .await;

        assert_eq!(summaries[1].pages_fetched, 2);
        a.assert_async().await;
    }

    #[tokio::test]
    async fn test_visited_tracking_skips_repeats() {
        let mut server = mockito::Server::new_async().await;
        let root_mock = page(
            &mut server,
            "/",
            r##"<a href="/a">1</a><a href="/a#part">2</a><a href="/">home</a>"##,
            1,
        )
        .await;
        let a = page(&mut server, "/a", "<p>a</p>", 1).await;

        let storage = tempfile::tempdir().unwrap();
        let (_workspace, mut writer, fetcher) = setup(storage.path()).await;
        let root = Url::parse(&format!("{}/", server.url())).unwrap();
        let config = MirrorConfig::default().with_visited_tracking(true);

        let summaries = LevelCrawler::new(&fetcher, &mut writer, &root, &config)
            .run(2, |_| {})
            .await;

        assert_eq!(summaries[1].pages_requested, 1);
        assert_eq!(summaries[1].pages_skipped, 2);
        root_mock.assert_async().await;
        a.assert_async().await;
    }

    #[tokio::test]
    async fn test_slow_assets_do_not_drop_later_pages() {
        let mut server = mockito::Server::new_async().await;
        let html = r#"<script src="/s1.js"></script><script src="/s2.js"></script>
            <script src="/s3.js"></script><a href="/from-a">n</a>"#;
        let _a = page(&mut server, "/a", html, 1).await;
        let b = page(&mut server, "/b", r#"<a href="/from-b">n</a>"#, 1).await;
        let mut scripts = Vec::new();
        for path in ["/s1.js", "/s2.js", "/s3.js"] {
            // Each script alone is well inside the timeout; together they aren't
            let mock = server
                .mock("GET", path)
                .with_status(200)
                .with_chunked_body(|w| {
                    std::thread::sleep(std::time::Duration::from_millis(700));
                    std::io::Write::write_all(w, b"run()")
                })
                .create_async()
                .await;
            scripts.push(mock);
        }

        let storage = tempfile::tempdir().unwrap();
        let (workspace, mut writer, _) = setup(storage.path()).await;
        let config = MirrorConfig::default()
            .with_timeout(std::time::Duration::from_millis(1500))
            .with_asset_concurrency(1);
        let fetcher = Fetcher::new(&config).unwrap();
        let root = Url::parse(&format!("{}/", server.url())).unwrap();
        let frontier = vec![root.join("/a").unwrap().to_string(), root.join("/b").unwrap().to_string()];

        let (summary, next) = LevelCrawler::new(&fetcher, &mut writer, &root, &config)
            .crawl_level(2, frontier)
            .await;

        assert_eq!(summary.pages_fetched, 2);
        assert_eq!(
            next,
            vec![root.join("/from-a").unwrap().to_string(), root.join("/from-b").unwrap().to_string()]
        );
        assert_eq!(std::fs::read_dir(workspace.root().join("js")).unwrap().count(), 3);
        assert_eq!(std::fs::read_dir(workspace.root().join("html")).unwrap().count(), 2);
        b.assert_async().await;
    }

    #[tokio::test]
    async fn test_unsaved_page_still_yields_links() {
        let mut server = mockito::Server::new_async().await;
        let _root = page(&mut server, "/", r#"<a href="/a">a</a>"#, 1).await;

        let storage = tempfile::tempdir().unwrap();
        let (workspace, mut writer, fetcher) = setup(storage.path()).await;
        std::fs::remove_dir(workspace.root().join("html")).unwrap();
        let root = Url::parse(&format!("{}/", server.url())).unwrap();
        let config = MirrorConfig::default();

        let summaries = LevelCrawler::new(&fetcher, &mut writer, &root, &config)
            .run(1, |_| {})
            .await;

        assert_eq!(summaries[0].pages_fetched, 1);
        assert_eq!(summaries[0].pages_unsaved, 1);
        assert_eq!(summaries[0].links_found, 1);
    }

    #[tokio::test]
    async fn test_failed_page_contributes_no_links() {
        let mut server = mockito::Server::new_async().await;
        let _root = page(&mut server, "/", r#"<a href="/dead">d</a><a href="/ok">o</a>"#, 1).await;
        let _dead = server.mock("GET", "/dead").with_status(500).create_async().await;
        let _ok = page(&mut server, "/ok", r#"<a href="/next">n</a>"#, 1).await;

        let storage = tempfile::tempdir().unwrap();
        let (_workspace, mut writer, fetcher) = setup(storage.path()).await;
        let root = Url::parse(&format!("{}/", server.url())).unwrap();
        let config = MirrorConfig::default();

        let summaries = LevelCrawler::new(&fetcher, &mut writer, &root, &config)
            .run(2, |_| {})
            .await;

        assert_eq!(summaries[1].pages_requested, 2);
        assert_eq!(summaries[1].pages_fetched, 1);
        assert_eq!(summaries[1].links_found, 1);
    }
}

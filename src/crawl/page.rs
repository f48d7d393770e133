// src/crawl/page.rs
// =============================================================================
// Processing a single crawled page.
//
// For one page we:
// 1. Save the raw HTML into html/
// 2. Find <link href> containing ".css", <script src> and <img src> with a
//    jpg/jpeg/png/gif suffix
// 3. Name them (in that order) and download them, a few at a time
// 4. Return every <a href>, joined against the ROOT crawl URL, duplicates
//    and all. This list feeds the next level's frontier.
//
// The HTML is parsed in a plain function that returns owned strings, so the
// scraper DOM is gone before the first .await.
//
// Rust concepts:
// - LazyLock: selectors are parsed once, the first time they are used
// - &mut borrow: the parser borrows the job's ResourceWriter, so only one
//   page at a time can hand out external_<kind>_<n> names
// - Streams: assets are downloaded a few at a time with .buffered()
// =============================================================================

use crate::error::FetchError;
use crate::fetch::{BodyKind, FetchedResource, Fetcher};
use crate::resource::{
    resolve_url, store, ImageFormat, PlannedResource, ResolveBase, ResourceKind, ResourceReference,
    ResourceWriter,
};
use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};
use std::path::PathBuf;
use std::sync::LazyLock;
use url::Url;

// These selectors are constants, so parsing them can't fail at runtime
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("link[href]").expect("valid selector"));
static SCRIPT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script[src]").expect("valid selector"));
static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").expect("valid selector"));
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Raw attribute values pulled out of one HTML document, in document order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageScan {
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
    pub images: Vec<(String, ImageFormat)>,
    pub anchors: Vec<String>,
}

/// Extracts resource references and hyperlinks from HTML.
pub fn scan_page(html: &str) -> PageScan {
    let document = Html::parse_document(html);

    let attr_values = |selector: &Selector, attr: &str| -> Vec<String> {
        document
            .select(selector)
            .filter_map(|element| element.value().attr(attr))
            .map(str::to_string)
            .collect()
    };

    let stylesheets = attr_values(&*LINK_SELECTOR, "href")
        .into_iter()
        .filter(|href| href.contains(".css"))
        .collect();

    let images = attr_values(&*IMG_SELECTOR, "src")
        .into_iter()
        .filter_map(|src| ImageFormat::from_url_suffix(&src).map(|format| (src, format)))
        .collect();

    PageScan {
        stylesheets,
        scripts: attr_values(&*SCRIPT_SELECTOR, "src"),
        images,
        anchors: attr_values(&*ANCHOR_SELECTOR, "href"),
    }
}

/// What processing one downloaded page produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedPage {
    /// Where the page HTML was written. None when the write failed.
    pub html_path: Option<PathBuf>,
    /// Outbound links, joined against the root URL, duplicates kept.
    pub links: Vec<String>,
}

/// Saves pages and their assets for one job.
pub struct PageParser<'a> {
    fetcher: &'a Fetcher,
    writer: &'a mut ResourceWriter,
    root_url: &'a Url,
    asset_concurrency: usize,
}

impl<'a> PageParser<'a> {
    pub fn new(
        fetcher: &'a Fetcher,
        writer: &'a mut ResourceWriter,
        root_url: &'a Url,
        asset_concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            writer,
            root_url,
            asset_concurrency: asset_concurrency.max(1),
        }
    }

    /// Fetches `url`, saves it with its assets, and returns its outbound links.
    ///
    /// A page that can't be fetched yields a FetchError and saves nothing.
    pub async fn parse_page(&mut self, url: &str) -> Result<Vec<String>, FetchError> {
        // `?` hands a FetchError straight back: nothing is saved for this page
        let page = self.fetcher.fetch_str(url, BodyKind::Text).await?;
        Ok(self.process_page(page).await.links)
    }

    /// Same as `parse_page` for a page that has already been downloaded.
    ///
    /// A page whose HTML can't be written still gets its assets saved and
    /// its links returned; `html_path` is None in that case.
    pub async fn process_page(&mut self, page: FetchedResource) -> ProcessedPage {
        // Scan first; the DOM is dropped before anything is awaited
        let scan = scan_page(page.body.as_text().unwrap_or_default());

        let html_path = match self.writer.save_page(&page).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(url = %page.url, error = %e, "Could not save page HTML");
                None
            }
        };

        // Names are handed out here, before any asset request is sent
        let planned = self.plan_assets(&scan, &page.url);
        self.download_assets(&planned).await;

        // Anchors use the ROOT url as their base, not the page url
        let links = scan
            .anchors
            .iter()
            .filter_map(|href| resolve_url(self.root_url, href))
            .map(String::from)
            .collect();

        ProcessedPage { html_path, links }
    }

    // Names every asset up front so the counter advances in document order.
    fn plan_assets(&mut self, scan: &PageScan, page_url: &Url) -> Vec<PlannedResource> {
        let stylesheets = scan
            .stylesheets
            .iter()
            .map(|href| (ResourceKind::Stylesheet, href.as_str(), ResolveBase::PageUrl));
        let scripts = scan
            .scripts
            .iter()
            .map(|src| (ResourceKind::Script, src.as_str(), ResolveBase::RootUrl));
        let images = scan
            .images
            .iter()
            .map(|(src, format)| (ResourceKind::Media(*format), src.as_str(), ResolveBase::RootUrl));

        // css first, then js, then images: the same order a one-by-one crawl
        // would save them in, so the counter hands out the same numbers
        let mut planned = Vec::new();
        for (kind, source, base) in stylesheets.chain(scripts).chain(images) {
            match ResourceReference::resolve(kind, source, base, Some(page_url), self.root_url) {
                Some(reference) => planned.push(self.writer.plan(reference)),
                None => tracing::debug!(source, "Unresolvable resource reference"),
            }
        }
        planned
    }

    // Downloads concurrently, writes in plan order. One failure never stops
    // the others.
    async fn download_assets(&self, planned: &[PlannedResource]) {
        // Copy the &Fetcher out so the async blocks don't borrow `self`
        let fetcher = self.fetcher;

        // Every download finishes before the first write starts. Requests
        // still in flight are never left unpolled while we wait on the disk.
        let downloads: Vec<_> = stream::iter(planned)
            .map(|resource| async move {
                let fetched = fetcher
                    .fetch(&resource.reference.resolved, resource.reference.kind.body_kind())
                    .await;
                (resource, fetched)
            })
            .buffered(self.asset_concurrency)
            .collect()
            .await;

        for (resource, fetched) in downloads {
            // A failed fetch is logged inside store() and skipped
            store(resource, fetched).await;
        }
    }
}

// src/resource/writer.rs
// =============================================================================
// Picks a local path for every resource and writes its bytes there.
//
// Naming rules:
// 1. Candidate = Content-Disposition filename (pages only) or the last path
//    segment of the resolved URL.
// 2. Unusable candidates become external_<kind>_<n>. `n` comes from one
//    counter per job, shared by all kinds, so generated names never repeat
//    inside a job.
// 3. The kind's extension is appended when missing.
//
// Naming happens before fetching (plan), so a caller can fetch many planned
// resources at once and still get the same names a one-by-one crawl would.
// Saving the same URL twice is allowed; the later write wins.
//
// Rust concepts:
// - &mut self: handing out a generated name bumps the counter, so naming
//   needs exclusive access to the writer
// - Option<PathBuf>: "saved here" or "skipped", with the reason in the log
// =============================================================================

use super::kind::{ResourceKind, ResourceReference};
use super::naming::{content_disposition_filename, ensure_extension, last_segment, needs_generated_name};
use crate::error::{FetchError, MirrorError};
use crate::fetch::{FetchedBody, FetchedResource, Fetcher};
use crate::workspace::Workspace;
use std::path::{Path, PathBuf};

/// A reference with its local target path decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedResource {
    pub reference: ResourceReference,
    pub target: PathBuf,
}

/// Writes one job's resources into its workspace.
///
/// Owns the job's external-name counter; never share a writer between jobs.
#[derive(Debug)]
pub struct ResourceWriter {
    workspace: Workspace,
    next_external: u64,
}

impl ResourceWriter {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            next_external: 0,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// How many external_<kind>_<n> names have been handed out.
    pub fn generated_names(&self) -> u64 {
        self.next_external
    }

    /// Local path for a resource of `kind` whose preferred name is `candidate`.
    pub fn target_path(&mut self, kind: ResourceKind, candidate: &str) -> PathBuf {
        let name = if needs_generated_name(candidate) {
            // Take the current number, then advance: every n is used once
            let n = self.next_external;
            self.next_external += 1;
            format!("external_{}_{}", kind.label(), n)
        } else {
            candidate.to_string()
        };

        // `name` is a single path component here, so the result always sits
        // directly inside the kind's subdirectory
        self.workspace
            .dir_for(&kind)
            .join(ensure_extension(&name, kind.extension()))
    }

    /// Decides where a stylesheet, script or image will be written.
    pub fn plan(&mut self, reference: ResourceReference) -> PlannedResource {
        let candidate = last_segment(reference.resolved.as_str()).to_string();
        let target = self.target_path(reference.kind, &candidate);
        PlannedResource { reference, target }
    }

    /// Writes an already-fetched page document into `html/`.
    pub async fn save_page(&mut self, page: &FetchedResource) -> Result<PathBuf, MirrorError> {
        // Prefer the server's suggested filename, else the URL's last segment
        let candidate = page
            .content_disposition
            .as_deref()
            .and_then(content_disposition_filename)
            .unwrap_or_else(|| last_segment(page.url.as_str()).to_string());

        let target = self.target_path(ResourceKind::Page, &candidate);
        write_body(&target, &page.body).await?;
        Ok(target)
    }

    /// Plans, fetches and writes one resource.
    ///
    /// Failures are logged and swallowed: None means this one resource was
    /// skipped.
    pub async fn save_resource(&mut self, reference: ResourceReference, fetcher: &Fetcher) -> Option<PathBuf> {
        let planned = self.plan(reference);
        let fetched = fetcher
            .fetch(&planned.reference.resolved, planned.reference.kind.body_kind())
            .await;
        store(&planned, fetched).await
    }
}

/// Writes a fetched resource to its planned path, or logs why it was skipped.
pub async fn store(planned: &PlannedResource, fetched: Result<FetchedResource, FetchError>) -> Option<PathBuf> {
    // A failed download only costs this one resource
    let resource = match fetched {
        Ok(resource) => resource,
        Err(e) => {
            tracing::warn!(
                kind = planned.reference.kind.label(),
                source = %planned.reference.source,
                error = %e,
                "Skipping resource"
            );
            return None;
        }
    };

    match write_body(&planned.target, &resource.body).await {
        Ok(()) => {
            tracing::debug!(
                url = %resource.url,
                path = %planned.target.display(),
                "Saved resource"
            );
            Some(planned.target.clone())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Could not write resource");
            None
        }
    }
}

async fn write_body(path: &Path, body: &FetchedBody) -> Result<(), MirrorError> {
    tokio::fs::write(path, body.as_bytes())
        .await
        .map_err(|e| MirrorError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorConfig;
    use crate::job::JobId;
    use crate::resource::kind::{ImageFormat, ResolveBase};
    use crate::resource::naming::FORBIDDEN_CHARS;
    use crate::workspace::create_workspace;
    use url::Url;

    async fn writer(storage: &Path) -> ResourceWriter {
        let workspace = create_workspace(storage, &JobId::new()).await.unwrap();
        ResourceWriter::new(workspace)
    }

    fn reference(kind: ResourceKind, url: &str) -> ResourceReference {
        let root = Url::parse("https://example.com/").unwrap();
        ResourceReference::resolve(kind, url, ResolveBase::RootUrl, None, &root).unwrap()
    }

    #[tokio::test]
    async fn test_plain_name_kept() {
        let storage = tempfile::tempdir().unwrap();
        let mut writer = writer(storage.path()).await;

        let planned = writer.plan(reference(ResourceKind::Stylesheet, "/assets/style.css"));

        assert_eq!(planned.target, writer.workspace().root().join("css").join("style.css"));
        assert_eq!(writer.generated_names(), 0);
    }

    #[tokio::test]
    async fn test_forbidden_name_replaced_with_counter() {
        let storage = tempfile::tempdir().unwrap();
        let mut writer = writer(storage.path()).await;

        let font = writer.plan(reference(
            ResourceKind::Stylesheet,
            "https://fonts.googleapis.com/css?family=Roboto",
        ));
        let script = writer.plan(reference(ResourceKind::Script, "/api/loader?v=3"));
        let image = writer.plan(reference(ResourceKind::Media(ImageFormat::Gif), "/t.gif?x=1.gif"));

        let css_dir = writer.workspace().root().join("css");
        let js_dir = writer.workspace().root().join("js");
        let media_dir = writer.workspace().root().join("media");
        assert_eq!(font.target, css_dir.join("external_css_0.css"));
        assert_eq!(script.target, js_dir.join("external_js_1.js"));
        assert_eq!(image.target, media_dir.join("external_media_2.gif"));
        assert_eq!(writer.generated_names(), 3);
    }

    #[tokio::test]
    async fn test_extension_appended() {
        let storage = tempfile::tempdir().unwrap();
        let mut writer = writer(storage.path()).await;

        let planned = writer.plan(reference(ResourceKind::Script, "/bundle"));
        assert_eq!(planned.target.file_name().unwrap(), "bundle.js");
    }

    #[tokio::test]
    async fn test_targets_stay_inside_kind_directory() {
        let storage = tempfile::tempdir().unwrap();
        let mut writer = writer(storage.path()).await;
        let sources = [
            "/a/b/c.css",
            "/..",
            "/%2e%2e/evil.css",
            "https://other.example/x:y.css",
            "/",
        ];

        for source in sources {
            let planned = writer.plan(reference(ResourceKind::Stylesheet, source));
            let name = planned.target.file_name().unwrap().to_str().unwrap();
            assert_eq!(planned.target.parent().unwrap(), writer.workspace().dir_for(&ResourceKind::Stylesheet));
            assert!(!name.contains(&FORBIDDEN_CHARS[..]), "{}", name);
            assert!(name.ends_with(".css"));
        }
    }

    #[tokio::test]
    async fn test_save_page_prefers_content_disposition() {
        let storage = tempfile::tempdir().unwrap();
        let mut writer = writer(storage.path()).await;
        let page = FetchedResource {
            url: Url::parse("https://example.com/").unwrap(),
            body: FetchedBody::Text("<html></html>".to_string()),
            content_disposition: Some("attachment; filename=\"home.html\"".to_string()),
        };

        let path = writer.save_page(&page).await.unwrap();

        assert_eq!(path, writer.workspace().root().join("html").join("home.html"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<html></html>");
    }

    #[tokio::test]
    async fn test_save_page_without_name_uses_counter() {
        let storage = tempfile::tempdir().unwrap();
        let mut writer = writer(storage.path()).await;
        let page = FetchedResource {
            url: Url::parse("https://example.com/").unwrap(),
            body: FetchedBody::Text("<p>hi</p>".to_string()),
            content_disposition: None,
        };

        let first = writer.save_page(&page).await.unwrap();
        let second = writer.save_page(&page).await.unwrap();

        assert_eq!(first.file_name().unwrap(), "external_html_0.html");
        assert_eq!(second.file_name().unwrap(), "external_html_1.html");
    }

    #[tokio::test]
    async fn test_save_resource_twice_overwrites() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/app.js")
            .with_status(200)
            .with_body("console.log(1);")
            .expect(2)
            .create_async()
            .await;
        let storage = tempfile::tempdir().unwrap();
        let mut writer = writer(storage.path()).await;
        let fetcher = Fetcher::new(&MirrorConfig::default()).unwrap();
        let url = format!("{}/app.js", server.url());

        let first = writer.save_resource(reference(ResourceKind::Script, &url), &fetcher).await;
        let second = writer.save_resource(reference(ResourceKind::Script, &url), &fetcher).await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(second.unwrap()).unwrap(), "console.log(1);");
    }

    #[tokio::test]
    async fn test_failed_fetch_is_skipped() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.png")
            .with_status(404)
            .create_async()
            .await;
        let storage = tempfile::tempdir().unwrap();
        let mut writer = writer(storage.path()).await;
        let fetcher = Fetcher::new(&MirrorConfig::default()).unwrap();
        let url = format!("{}/gone.png", server.url());

        let saved = writer
            .save_resource(reference(ResourceKind::Media(ImageFormat::Png), &url), &fetcher)
            .await;

        assert_eq!(saved, None);
        assert!(!writer.workspace().root().join("media").join("gone.png").exists());
    }
}

// src/resource/kind.rs
// =============================================================================
// What a discovered reference points at, and where its URL is resolved from.
//
// Relative references are not all resolved the same way:
// - stylesheets are joined against the page they were found on
// - scripts, images and anchors are joined against the root crawl URL
// ResolveBase makes that choice explicit at every call site.
// =============================================================================

use crate::fetch::BodyKind;
use url::Url;

/// Image formats that get mirrored. Anything else (svg, webp, ...) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpg,
    Jpeg,
    Png,
    Gif,
}

impl ImageFormat {
    const ALL: [ImageFormat; 4] = [
        ImageFormat::Jpg,
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
        }
    }

    /// Format named by the URL's suffix. Case-sensitive, and the suffix must
    /// be at the very end (`pic.png?v=2` does not qualify).
    pub fn from_url_suffix(src: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| {
            src.strip_suffix(format.extension())
                .is_some_and(|rest| rest.ends_with('.'))
        })
    }
}

/// Kind of a mirrored resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// The HTML document of a crawled page.
    Page,
    Stylesheet,
    Script,
    Media(ImageFormat),
}

impl ResourceKind {
    /// Workspace subdirectory and the `<kind>` in `external_<kind>_<n>`.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Page => "html",
            ResourceKind::Stylesheet => "css",
            ResourceKind::Script => "js",
            ResourceKind::Media(_) => "media",
        }
    }

    /// Extension every saved file of this kind must end with.
    pub fn extension(&self) -> &'static str {
        match self {
            ResourceKind::Page => "html",
            ResourceKind::Stylesheet => "css",
            ResourceKind::Script => "js",
            ResourceKind::Media(format) => format.extension(),
        }
    }

    pub fn body_kind(&self) -> BodyKind {
        match self {
            ResourceKind::Media(_) => BodyKind::Binary,
            _ => BodyKind::Text,
        }
    }
}

/// URL a relative reference is joined against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveBase {
    /// The page the reference was found on.
    PageUrl,
    /// The job's root crawl URL.
    RootUrl,
}

impl ResolveBase {
    /// Picks the base URL. Falls back to the root when no page URL is known.
    pub fn pick<'a>(self, page_url: Option<&'a Url>, root_url: &'a Url) -> &'a Url {
        match (self, page_url) {
            (ResolveBase::PageUrl, Some(page)) => page,
            _ => root_url,
        }
    }
}

/// A resource found on a page, with its URL made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    pub kind: ResourceKind,
    /// The attribute value as written in the HTML.
    pub source: String,
    pub resolved: Url,
}

impl ResourceReference {
    /// Resolves `source` to an absolute URL. Sources that already parse as
    /// absolute are kept as they are; everything else is joined against the
    /// chosen base. Returns None when neither works.
    pub fn resolve(
        kind: ResourceKind,
        source: &str,
        base: ResolveBase,
        page_url: Option<&Url>,
        root_url: &Url,
    ) -> Option<Self> {
        let resolved = resolve_url(base.pick(page_url, root_url), source)?;
        Some(Self {
            kind,
            source: source.to_string(),
            resolved,
        })
    }
}

/// Absolute URLs pass through; relative ones are joined against `base`.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(_) => base.join(href).ok(),
    }
}

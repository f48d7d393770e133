// src/fetch/http.rs
// =============================================================================
// Downloads pages and assets over HTTP.
//
// Every call returns Result<FetchedResource, FetchError>. Nothing here panics
// or retries; callers decide whether a failure skips one asset or one page.
//
// Text bodies (html, css, js) are decoded with the charset the server sends
// so they can be written back out as UTF-8. Media is kept as raw bytes.
// =============================================================================

use crate::config::MirrorConfig;
use crate::error::{FetchError, FetchErrorKind, MirrorError};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::Client;
use url::Url;

/// How a response body should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Text,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedBody {
    Text(String),
    Binary(Vec<u8>),
}

impl FetchedBody {
    /// Bytes as they go to disk. Text is UTF-8.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FetchedBody::Text(text) => text.as_bytes(),
            FetchedBody::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FetchedBody::Text(text) => Some(text),
            FetchedBody::Binary(_) => None,
        }
    }
}

/// A successful download.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: Url,
    pub body: FetchedBody,
    /// Raw `Content-Disposition` header, if the server sent one.
    pub content_disposition: Option<String>,
}

/// Shared HTTP client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &MirrorConfig) -> Result<Self, MirrorError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(MirrorError::Client)?;

        Ok(Self { client })
    }

    /// Fetches a URL given as a string, as frontier entries are.
    pub async fn fetch_str(&self, url: &str, body: BodyKind) -> Result<FetchedResource, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::new(url, FetchErrorKind::InvalidUrl))?;
        self.fetch(&parsed, body).await
    }

    /// Issues a GET and reads the body. Non-2xx statuses are failures.
    pub async fn fetch(&self, url: &Url, body: BodyKind) -> Result<FetchedResource, FetchError> {
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(FetchError::new(url.as_str(), FetchErrorKind::InvalidUrl));
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| categorize_error(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url.as_str(), FetchErrorKind::Status(status.as_u16())));
        }

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match body {
            BodyKind::Text => FetchedBody::Text(
                response
                    .text()
                    .await
                    .map_err(|e| categorize_error(url.as_str(), e))?,
            ),
            BodyKind::Binary => FetchedBody::Binary(
                response
                    .bytes()
                    .await
                    .map_err(|e| categorize_error(url.as_str(), e))?
                    .to_vec(),
            ),
        };

        Ok(FetchedResource {
            url: url.clone(),
            body,
            content_disposition,
        })
    }
}

// Maps a reqwest error onto the failure kinds we report.
fn categorize_error(url: &str, error: reqwest::Error) -> FetchError {
    let kind = if error.is_timeout() {
        FetchErrorKind::Timeout
    } else if error.is_redirect() {
        FetchErrorKind::TooManyRedirects
    } else if error.is_connect() {
        FetchErrorKind::Connect
    } else if error.is_builder() {
        FetchErrorKind::InvalidUrl
    } else if let Some(status) = error.status() {
        FetchErrorKind::Status(status.as_u16())
    } else {
        FetchErrorKind::Other(error.to_string())
    };

    FetchError::new(url, kind)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why return FetchError instead of anyhow::Error?
//    - Callers match on it: a failed asset is skipped, a failed page drops its
//      links, and neither should look like a fatal job error
//
// 2. Why check the scheme before sending?
//    - Anchors are followed as written, so mailto:, javascript: and the like
//      end up in the frontier. They fail here without touching the network.
//
// 3. Why is Fetcher Clone?
//    - reqwest::Client is reference counted; clones share one connection pool
// -----------------------------------------------------------------------------

// src/fetch/mod.rs
// =============================================================================
// HTTP downloading for pages and assets.
//
// Submodules:
// - http: the reqwest-backed Fetcher and its result types
// =============================================================================

mod http;

pub use http::{BodyKind, FetchedBody, FetchedResource, Fetcher};

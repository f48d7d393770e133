// src/resource/mod.rs
// =============================================================================
// Classifying, naming and saving the resources found on crawled pages.
//
// Submodules:
// - kind: resource kinds, image formats, URL resolution
// - naming: filename derivation and sanitizing
// - writer: the per-job ResourceWriter that writes into the workspace
// =============================================================================

mod kind;
mod naming;
mod writer;

pub use kind::{resolve_url, ImageFormat, ResolveBase, ResourceKind, ResourceReference};
pub use naming::{has_forbidden_characters, FORBIDDEN_CHARS};
pub use writer::{store, PlannedResource, ResourceWriter};

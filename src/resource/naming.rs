// src/resource/naming.rs
// =============================================================================
// Turning URLs and response headers into safe local filenames.
//
// A candidate name is the Content-Disposition filename (pages only) or the
// last path segment of the resolved URL. Candidates that could escape the
// workspace or upset the filesystem are replaced with external_<kind>_<n>
// by the writer, which owns the counter.
// =============================================================================

/// Characters that never reach the filesystem.
pub const FORBIDDEN_CHARS: [char; 9] = [':', '?', '*', '\\', '|', '/', '<', '>', '"'];

pub fn has_forbidden_characters(name: &str) -> bool {
    name.chars().any(|c| FORBIDDEN_CHARS.contains(&c))
}

/// True when `name` can't be used as-is and must be replaced by a
/// generated one.
pub fn needs_generated_name(name: &str) -> bool {
    name.is_empty()
        || name == "."
        || name == ".."
        || has_forbidden_characters(name)
        || name.chars().any(char::is_control)
}

/// Everything after the last `/` of the URL string, query included.
///
/// `https://example.com/css/site.css` -> `site.css`
/// `https://example.com/` -> `` (empty)
pub fn last_segment(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or("")
}

/// Filename from a `Content-Disposition` header value.
///
/// `attachment; filename="report.html"` -> `report.html`
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    let value = rest.split(';').next().unwrap_or("").trim();
    let value = value.trim_matches('"').trim();

    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Appends `.ext` unless `name` already ends with it.
pub fn ensure_extension(name: &str, ext: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, current)) if current == ext => name.to_string(),
        _ => format!("{}.{}", name, ext),
    }
}

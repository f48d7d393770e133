// src/archive/mod.rs
// =============================================================================
// Bundles a finished workspace into a single zip file.
//
// The zip is written next to the workspace directory:
//
//   storage/task_<id>/...      (workspace)
//   storage/task_<id>.zip      (archive)
//
// Entries are relative to the storage root, so every member starts with
// `task_<id>/`. Directories get their own entries. The walk is sorted by
// file name, so archiving the same tree twice gives the same member list.
//
// Rust concepts:
// - WalkDir: recursive directory iterator (yields the root itself first)
// - let ... else: skip an entry without nesting the rest of the loop body
// - Closures as error mappers: one `zip_err` reused for every zip call
// =============================================================================

use crate::error::MirrorError;
use crate::workspace::Workspace;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Where the archive for `workspace` goes.
pub fn archive_path_for(workspace: &Workspace) -> PathBuf {
    workspace
        .storage_root()
        .join(format!("{}.zip", workspace.name()))
}

/// Zips every file and directory under the workspace. Returns the zip path.
///
/// Blocking; run it on a blocking thread from async code.
pub fn archive_workspace(workspace: &Workspace) -> Result<PathBuf, MirrorError> {
    let archive_path = archive_path_for(workspace);
    // Every zip call fails the same way, so build the error in one place
    let zip_err = |source: zip::result::ZipError| MirrorError::Archive {
        path: archive_path.clone(),
        source,
    };

    let file = File::create(&archive_path).map_err(|e| MirrorError::io(&archive_path, e))?;
    let mut zip = ZipWriter::new(file);
    // Deflate: the standard compression every unzip tool understands
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let root = workspace.root();
    let mut members = 0usize;

    for entry in WalkDir::new(&root).sort_by_file_name() {
        // walkdir errors carry the path when they have one; fall back to root
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
            MirrorError::io(path, e.into())
        })?;

        // Member names are relative to the storage root ("task_<id>/css/a.css").
        // A path outside it has no name and is skipped.
        let Some(name) = entry_name(workspace.storage_root(), entry.path()) else {
            continue;
        };

        if entry.file_type().is_dir() {
            // Directory entries end with '/' in zip files
            zip.add_directory(format!("{}/", name), options).map_err(zip_err)?;
        } else {
            // start_file opens a member; bytes copied into `zip` go into it
            zip.start_file(name, options).map_err(zip_err)?;
            let mut member = File::open(entry.path()).map_err(|e| MirrorError::io(entry.path(), e))?;
            std::io::copy(&mut member, &mut zip).map_err(|e| MirrorError::io(entry.path(), e))?;
        }
        members += 1;
    }

    // Writes the central directory; without it the file isn't a valid zip
    zip.finish().map_err(zip_err)?;

    tracing::info!(
        archive = %archive_path.display(),
        members,
        "Archive written"
    );
    Ok(archive_path)
}

// Archive member name: path relative to `base`, `/`-separated.
fn entry_name(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Checks if a directory entry is hidden (starts with '.').
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

/// Recursively lists all files below `dir`, in a stable (name-sorted) order.
///
/// Hidden entries are skipped unless `include_hidden` is set; a hidden directory
/// is not descended into. The root itself is always walked. I/O errors met during
/// traversal are returned.
pub fn list_files_walkdir_filtered(dir: &Path, include_hidden: bool) -> Result<Vec<PathBuf>, walkdir::Error> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        })
        .collect()
}

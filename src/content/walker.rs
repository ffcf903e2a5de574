//! Markdown file discovery under a content root

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Collect every markdown file below `root`, descending into subdirectories.
///
/// A missing root yields an empty list. Entries are visited in file-name
/// order so repeated walks of an unchanged tree return the same sequence.
pub fn markdown_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        tracing::debug!("Content root {:?} does not exist", root);
        return Vec::new();
    }

    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {:?}: {}", root, e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_markdown_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Check if a file is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

/// True for a single normal path component (no separators, `.` or `..`)
pub fn is_plain_segment(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !segment.contains(['/', '\\'])
}

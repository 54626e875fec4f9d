use camino::Utf8Path;
use std::cmp::Ordering;
use std::fs;
use walkdir::{DirEntry, WalkDir};

/// How a walked entry is treated when the skeleton is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    /// A symlink whose target is a directory. Never entered.
    LinkedDirectory,
    /// Anything else gets a placeholder: regular files, links to files,
    /// dangling links, special files.
    File,
}

impl EntryKind {
    pub fn of(entry: &DirEntry) -> Self {
        let ft = entry.file_type();
        if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_symlink() && entry.path().is_dir() {
            EntryKind::LinkedDirectory
        } else {
            EntryKind::File
        }
    }
}

/// Walker over a source tree: links are not followed, and inside each
/// directory the non-directories come before the subdirectories, each group
/// by name.
///
/// The root itself is followed if it is a link; the user named it.
pub fn walk_source(root: &Utf8Path) -> WalkDir {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by(order_entries)
}

fn order_entries(a: &DirEntry, b: &DirEntry) -> Ordering {
    let a_key = (a.file_type().is_dir(), a.file_name());
    let b_key = (b.file_type().is_dir(), b.file_name());
    a_key.cmp(&b_key)
}

/// Whether anything occupies `path`. A dangling symlink counts.
pub fn entry_exists(path: &Utf8Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

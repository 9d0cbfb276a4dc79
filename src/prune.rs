//! Removal of directories left empty after sorting.

use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Removes every empty directory below `root`, deepest first. `root` itself is kept.
///
/// A directory that empties out because its only children were empty
/// directories is removed too. Directories that are already gone or not
/// empty are left alone without error. Symlinks are never followed.
///
/// Returns the number of directories removed.
pub fn prune_empty_dirs(root: &Path) -> usize {
    let mut removed = 0;

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        if remove_if_empty(entry.path()) {
            removed += 1;
        }
    }

    removed
}

fn remove_if_empty(dir: &Path) -> bool {
    let is_empty = match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => return false,
    };
    if !is_empty {
        return false;
    }

    // Already gone or refilled since the check.
    fs::remove_dir(dir).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removes_nested_empty_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a").join("b").join("c")).expect("create dirs");

        assert_eq!(prune_empty_dirs(root), 3);
        assert!(!root.join("a").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_keeps_dirs_with_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keep").join("empty")).expect("create dirs");
        fs::write(root.join("keep").join("file.txt"), "x").expect("write");

        assert_eq!(prune_empty_dirs(root), 1);
        assert!(root.join("keep").join("file.txt").exists());
        assert!(!root.join("keep").join("empty").exists());
    }

    #[test]
    fn test_empty_root_is_retained() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        assert_eq!(prune_empty_dirs(temp_dir.path()), 0);
        assert!(temp_dir.path().is_dir());
    }

    #[test]
    fn test_missing_root_is_not_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert_eq!(prune_empty_dirs(&temp_dir.path().join("gone")), 0);
    }
}

//! Recursive directory traversal with file filtering
//!
//! This is the discovery step of the compiler: walk a directory tree and
//! collect the relative paths of every file that should be compiled.

use crate::error::PathError;
use crate::fs::path::ExtensionSet;
use error_stack::{IntoReport, Result, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

/// Recursively list the files under `root` that pass the filter.
///
/// Directories are always recursed into and never appear in the result;
/// the dotfile rule and the filter predicate apply to files only, and only
/// to the bare filename. Returned paths are relative to `root`, with `/`
/// as the separator, in depth-first traversal order (a directory's children
/// are fully resolved before its next sibling; entries within a directory
/// come back in filesystem listing order, which is not guaranteed stable).
///
/// The directory check follows symlinks (the same semantics as a `stat`
/// call), so a symlink cycle will not terminate. The root must be an
/// existing directory; anything else fails the initial listing.
pub fn read_dir_recursive<P, F>(
    root: P,
    include_dotfiles: bool,
    filter: F,
) -> Result<Vec<String>, PathError>
where
    P: AsRef<Path>,
    F: Fn(&str) -> bool,
{
    let mut found = Vec::new();
    walk(root.as_ref(), &PathBuf::new(), include_dotfiles, &filter, &mut found)?;
    Ok(found)
}

/// Recursively list the compilable files under `root`.
///
/// Same traversal as [`read_dir_recursive`], with extension membership in
/// `exts` as the filter predicate.
pub fn read_dir_for_compilable<P>(
    root: P,
    include_dotfiles: bool,
    exts: &ExtensionSet,
) -> Result<Vec<String>, PathError>
where
    P: AsRef<Path>,
{
    read_dir_recursive(root, include_dotfiles, |filename| exts.is_compilable(filename))
}

fn walk(
    dir: &Path,
    relative: &Path,
    include_dotfiles: bool,
    filter: &dyn Fn(&str) -> bool,
    found: &mut Vec<String>,
) -> Result<(), PathError> {
    let entries = dir
        .read_dir()
        .into_report()
        .change_context_lazy(|| PathError::from(&dir))
        .attach_printable("failed to read directory")?;

    for entry in entries {
        let entry = entry
            .into_report()
            .change_context_lazy(|| PathError::from(&dir))
            .attach_printable("failed to read directory entry")?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();

        // follows symlinks
        let meta = fs::metadata(&path)
            .into_report()
            .change_context_lazy(|| PathError::from(&path))
            .attach_printable("failed to stat directory entry")?;

        if meta.is_dir() {
            // directories always recurse and contribute no entry themselves
            walk(&path, &relative.join(&name), include_dotfiles, filter, found)?;
        } else if (include_dotfiles || !name.starts_with('.')) && filter(&name) {
            found.push(to_forward_slashes(&relative.join(&name)));
        }
    }

    Ok(())
}

/// Render a relative path with `/` as the separator.
pub(crate) fn to_forward_slashes(p: &Path) -> String {
    let s = p.to_string_lossy();
    if cfg!(windows) {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

#[cfg(test)]
mod ut {
    use super::*;
    use std::fs;

    fn make_tree(root: &Path, files: &[&str]) {
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_all_files() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path(), &["a.ts", "sub/b.txt", "sub/deep/c.js"]);
        let found = read_dir_recursive(dir.path(), false, |_| true).unwrap();
        assert_eq!(
            vec!["a.ts", "sub/b.txt", "sub/deep/c.js"],
            sorted(found)
        );
    }

    #[test]
    fn test_filter_predicate() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path(), &["a.ts", "b.txt", "sub/c.ts"]);
        let found = read_dir_recursive(dir.path(), false, |f| f.ends_with(".ts")).unwrap();
        assert_eq!(vec!["a.ts", "sub/c.ts"], sorted(found));
    }

    #[test]
    fn test_dotfiles_excluded_by_default() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path(), &[".hidden.ts", "a.ts"]);
        let found = read_dir_recursive(dir.path(), false, |_| true).unwrap();
        assert_eq!(vec!["a.ts"], sorted(found));
    }

    #[test]
    fn test_dotfiles_included() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path(), &[".hidden.ts", "a.ts"]);
        let found = read_dir_recursive(dir.path(), true, |_| true).unwrap();
        assert_eq!(vec![".hidden.ts", "a.ts"], sorted(found));
    }

    #[test]
    fn test_dot_directories_always_recurse() {
        // the dotfile rule applies to the bare filename only,
        // never to ancestor directories
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path(), &[".hidden/x.ts"]);
        let found = read_dir_recursive(dir.path(), false, |_| true).unwrap();
        assert_eq!(vec![".hidden/x.ts"], sorted(found));
    }

    #[test]
    fn test_compilable_scenario() {
        let dir = tempfile::tempdir().unwrap();
        make_tree(dir.path(), &["a.ts", "b.txt", ".hidden.ts", "sub/c.js"]);
        let found =
            read_dir_for_compilable(dir.path(), false, &ExtensionSet::default()).unwrap();
        assert_eq!(vec!["a.ts", "sub/c.js"], sorted(found));
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_dir_recursive(dir.path().join("nope"), false, |_| true);
        assert!(result.is_err());
    }
}

//! Filesystem bookkeeping helpers

use crate::error::PathError;
use error_stack::{IntoReport, Result, ResultExt};
use std::fs;
use std::path::Path;

/// Copy the permission bits of `src` onto `dest`.
pub fn copy_permissions<P, Q>(src: P, dest: Q) -> Result<(), PathError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let meta = fs::metadata(&src)
        .into_report()
        .change_context_lazy(|| PathError::from(&src))
        .attach_printable("failed to read source permissions")?;
    fs::set_permissions(&dest, meta.permissions())
        .into_report()
        .change_context_lazy(|| PathError::from(&dest))
        .attach_printable("failed to set output permissions")?;
    Ok(())
}

/// Recursively delete a directory tree. A path that does not exist is a no-op.
///
/// The recursion uses no-follow metadata, so a symlink to a directory is
/// unlinked rather than descended into.
pub fn delete_dir<P>(path: P) -> Result<(), PathError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(());
    }
    let entries = path
        .read_dir()
        .into_report()
        .change_context_lazy(|| PathError::from(&path))
        .attach_printable("failed to read directory")?;
    for entry in entries {
        let entry = entry
            .into_report()
            .change_context_lazy(|| PathError::from(&path))
            .attach_printable("failed to read directory entry")?;
        let child = entry.path();
        let meta = fs::symlink_metadata(&child)
            .into_report()
            .change_context_lazy(|| PathError::from(&child))?;
        if meta.is_dir() {
            delete_dir(&child)?;
        } else {
            fs::remove_file(&child)
                .into_report()
                .change_context_lazy(|| PathError::from(&child))
                .attach_printable("failed to delete file")?;
        }
    }
    fs::remove_dir(path)
        .into_report()
        .change_context_lazy(|| PathError::from(&path))
        .attach_printable("failed to remove directory")?;
    Ok(())
}

/// Append a `sourceMappingURL` comment pointing at `loc` to compiled output.
///
/// Only the file name of `loc` ends up in the comment, so the map is
/// expected to sit next to the output file.
pub fn add_source_mapping_url(code: &str, loc: &Path) -> String {
    let base = loc
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{code}\n//# sourceMappingURL={base}")
}

#[cfg(test)]
mod ut {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn test_delete_dir_missing_is_noop() {
        assert!(delete_dir(PathBuf::from("target/does-not-exist-anywhere")).is_ok());
    }

    #[test]
    fn test_delete_dir_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("out");
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/c.js"), "x").unwrap();
        fs::write(root.join("top.js"), "y").unwrap();
        delete_dir(&root).unwrap();
        assert!(!root.exists());
    }

    #[test]
    fn test_add_source_mapping_url() {
        let out = add_source_mapping_url("var x = 1;", Path::new("dist/sub/a.js.map"));
        assert_eq!("var x = 1;\n//# sourceMappingURL=a.js.map", out);
    }
}

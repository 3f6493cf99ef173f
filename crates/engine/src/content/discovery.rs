use std::fs;
use std::path::{Path, PathBuf};

use super::error::ContentError;

/// Every file under `dir` (recursively) whose name ends with `extension`, sorted by
/// path so load order does not depend on the filesystem. A missing directory yields
/// no files.
pub(crate) fn files_with_extension(
    dir: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>, ContentError> {
    let mut found = Vec::new();
    if dir.is_dir() {
        collect(dir, extension, &mut found)?;
    }
    found.sort();
    Ok(found)
}

fn collect(dir: &Path, extension: &str, found: &mut Vec<PathBuf>) -> Result<(), ContentError> {
    let read_error = |source| ContentError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_dir() {
            collect(&path, extension, found)?;
        } else if path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(extension))
        {
            found.push(path);
        }
    }
    Ok(())
}

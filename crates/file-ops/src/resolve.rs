//! Local path resolution.

use std::io;
use std::path::{Path, PathBuf};

/// Expands `~` prefix to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        crate::home_dir().join(rest)
    } else if path == "~" {
        crate::home_dir()
    } else {
        PathBuf::from(path)
    }
}

/// Resolves a possibly relative, possibly `~`-prefixed path to its canonical
/// absolute form.
///
/// Fails if the path does not exist.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let expanded = match path.to_str() {
        Some(s) => expand_home(s),
        None => path.to_path_buf(),
    };
    std::fs::canonicalize(expanded)
}

/// Resolves the path of a file named `file_name` that sits next to
/// `existing`, which must already exist.
///
/// Only the directory is canonicalized, so a symlinked `existing` gets its
/// sibling beside the link rather than beside the link's target.
pub fn resolve_sibling(existing: &Path, file_name: &str) -> io::Result<PathBuf> {
    let expanded = match existing.to_str() {
        Some(s) => expand_home(s),
        None => existing.to_path_buf(),
    };
    std::fs::metadata(&expanded)?;

    let dir = match expanded.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    Ok(std::fs::canonicalize(dir)?.join(file_name))
}

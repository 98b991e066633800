//! Storage layout: `<working dir>/lib/<kind>/<name>`.

use std::path::{Path, PathBuf};

use enginedock_protocol::LIB_DIR;

use crate::StoreError;

/// Reduces a client-supplied name to its final path component.
///
/// Both `/` and `\` count as separators, since browsers on Windows may send
/// the full local path as the filename. Trailing separators are ignored.
/// Names that reduce to nothing, `.` or `..` are rejected.
pub fn sanitize_component(raw: &str) -> Result<&str, StoreError> {
    let trimmed = raw.trim_end_matches(['/', '\\']);
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or_default();

    match base {
        "" | "." | ".." => Err(StoreError::InvalidName(raw.to_string())),
        name => Ok(name),
    }
}

/// Returns where an artifact of `kind` uploaded as `file_name` is stored.
pub fn storage_path(
    working_directory: &Path,
    kind: &str,
    file_name: &str,
) -> Result<PathBuf, StoreError> {
    let kind = sanitize_component(kind)?;
    let name = sanitize_component(file_name)?;
    Ok(working_directory.join(LIB_DIR).join(kind).join(name))
}

//! Multipart packaging and output naming.

use std::path::Path;

use enginedock_protocol::RemoteOperation;
use reqwest::multipart::Part;
use tokio::io::AsyncReadExt;

use crate::CompileError;

/// Reads the file at `path` (already resolved) into a multipart file part
/// named after its basename.
pub(crate) async fn file_part(path: &Path) -> Result<Part, CompileError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|source| CompileError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .await
        .map_err(|source| CompileError::Copy {
            path: path.to_path_buf(),
            source,
        })?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Part::bytes(data)
        .file_name(file_name)
        .mime_str("application/octet-stream")
        .map_err(CompileError::Buffer)
}

/// Name of the artifact produced from `primary` by `operation`: the
/// primary's basename with its last extension replaced.
///
/// `model.json` becomes `model.jar` for [`RemoteOperation::Compile`] and
/// `model.war` for [`RemoteOperation::MakeWar`]. A name without an
/// extension keeps its full stem.
pub fn output_file_name(primary: &Path, operation: RemoteOperation) -> Result<String, CompileError> {
    let stem = primary
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CompileError::OutputName(primary.to_path_buf()))?;

    Ok(format!("{stem}.{}", operation.output_extension()))
}

//! Compile client error types.

use std::path::PathBuf;

use enginedock_protocol::ParseOperationError;

/// Errors from the compile client. Each names the phase that failed.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed resolving path {}: {source}", path.display())]
    ResolvePath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed opening file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed copying file {}: {source}", path.display())]
    Copy {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed writing to buffer: {0}")]
    Buffer(reqwest::Error),

    #[error("failed uploading file: {0}")]
    Upload(reqwest::Error),

    #[error("failed reading upload response: {0}")]
    ReadResponse(reqwest::Error),

    #[error("failed uploading file: {status} / {body}")]
    Remote { status: String, body: String },

    #[error(transparent)]
    UnsupportedOperation(#[from] ParseOperationError),

    #[error("cannot derive an output name from {}", .0.display())]
    OutputName(PathBuf),

    #[error("download file creation failed: {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("download file copy failed: service to {}: {reason}", path.display())]
    CopyOutput { path: PathBuf, reason: String },
}

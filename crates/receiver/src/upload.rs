//! `POST /upload` handler.

use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use enginedock_file_ops::{ArtifactStore, Spool, StoreError, StoredArtifact, sanitize_component};
use enginedock_protocol::{FIELD_FILE, FIELD_KIND};
use tracing::{debug, error, info, warn};

use crate::auth::{AuthError, Identifier};
use crate::registry::{EngineId, Registry, RegistryError};

/// Why an upload was refused. Each variant maps to one HTTP status and its
/// message becomes the plain-text response body.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("Malformed request: {0}")]
    Malformed(String),

    /// The request body failed while being read: too large, cut short, or
    /// not valid multipart.
    #[error("{}", .0.body_text())]
    Request(#[from] MultipartError),

    #[error("{0}")]
    Storage(StoreError),

    #[error("Error writing uploaded file to disk: {0}")]
    Write(String),

    #[error("Error saving engine to datastore: {0}")]
    Registration(#[from] RegistryError),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::FORBIDDEN,
            Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Request(e) => e.status(),
            Self::Storage(_) | Self::Write(_) | Self::Registration(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for UploadError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidName(_) => Self::Malformed(e.to_string()),
            StoreError::CreateDir { .. } => Self::Storage(e),
            StoreError::Open { .. } | StoreError::Write { .. } => Self::Write(e.to_string()),
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Shared, read-only state behind the upload route.
pub(crate) struct UploadState {
    pub(crate) store: ArtifactStore,
    pub(crate) identifier: Arc<dyn Identifier>,
    pub(crate) registry: Arc<dyn Registry>,
}

pub(crate) async fn upload(
    State(state): State<Arc<UploadState>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    info!("file upload request received");

    match receive(&state, &headers, multipart).await {
        Ok((id, artifact)) => {
            info!(
                id,
                path = %artifact.path.display(),
                size = artifact.size,
                sha256 = %artifact.sha256,
                "engine uploaded"
            );
            StatusCode::OK.into_response()
        }
        Err(e) => {
            if e.status().is_server_error() {
                error!(status = %e.status(), error = %e, "upload failed");
            } else {
                warn!(status = %e.status(), error = %e, "upload rejected");
            }
            e.into_response()
        }
    }
}

async fn receive(
    state: &UploadState,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(EngineId, StoredArtifact), UploadError> {
    let principal = state.identifier.identify(headers)?;
    let mut multipart = multipart.map_err(|e| UploadError::Malformed(e.body_text()))?;

    let mut kind: Option<String> = None;
    // A file that arrived before its kind is spooled to disk until the kind
    // is known.
    let mut pending: Option<(String, Spool)> = None;
    let mut stored: Option<StoredArtifact> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FIELD_KIND) if kind.is_none() => {
                let text = field.text().await?;
                if !text.is_empty() {
                    kind = Some(text);
                }
            }
            Some(FIELD_FILE) if stored.is_none() && pending.is_none() => {
                let file_name = field
                    .file_name()
                    .map(str::to_owned)
                    .ok_or_else(|| UploadError::Malformed("file field has no filename".into()))?;
                debug!(remote_file = %file_name, "receiving file");

                match kind.as_deref() {
                    Some(kind) => {
                        stored = Some(write_field(&state.store, kind, &file_name, field).await?);
                    }
                    None => {
                        sanitize_component(&file_name)?;
                        let mut spool = state.store.spool().await?;
                        while let Some(chunk) = field.chunk().await? {
                            spool.write(&chunk).await?;
                        }
                        pending = Some((file_name, spool));
                    }
                }
            }
            _ => {}
        }
    }

    let artifact = match (stored, pending) {
        (Some(artifact), _) => artifact,
        (None, Some((file_name, spool))) => {
            let kind =
                kind.ok_or_else(|| UploadError::Malformed("missing kind field".into()))?;
            state.store.commit(spool, &kind, &file_name).await?
        }
        (None, None) => {
            return Err(UploadError::Malformed("request has no file field".into()));
        }
    };

    let id = state
        .registry
        .add_engine(&principal, &artifact.name, &artifact.path)
        .await?;

    Ok((id, artifact))
}

/// Streams a multipart file field into the store.
async fn write_field(
    store: &ArtifactStore,
    kind: &str,
    file_name: &str,
    mut field: Field<'_>,
) -> Result<StoredArtifact, UploadError> {
    let mut writer = store.create(kind, file_name).await?;
    while let Some(chunk) = field.chunk().await? {
        writer.write(&chunk).await?;
    }
    Ok(writer.finish().await?)
}

//! Kind-keyed artifact storage.
//!
//! Every artifact is written to a hidden temporary file next to its
//! destination and renamed into place once complete. A second upload with
//! the same kind and name replaces the first; with concurrent writers to one
//! path the last rename wins. A write that never finishes leaves the previous
//! file untouched and its temporary file is removed on drop.

use std::path::{Path, PathBuf};

use enginedock_protocol::LIB_DIR;
use sha2::{Digest, Sha256};
use tempfile::TempPath;
use tokio::fs::{DirBuilder, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::layout::{sanitize_component, storage_path};

/// Prefix of in-progress files inside the storage tree.
const PARTIAL_PREFIX: &str = ".partial-";

/// Errors produced while storing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid artifact name: {0:?}")]
    InvalidName(String),

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// An artifact that has been fully written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// Sanitized kind (storage subdirectory).
    pub kind: String,
    /// Sanitized base filename.
    pub name: String,
    /// Full path of the stored file.
    pub path: PathBuf,
    /// Bytes written.
    pub size: u64,
    /// Hex SHA-256 of the written bytes.
    pub sha256: String,
}

/// Storage rooted at `<working dir>/lib`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    working_directory: PathBuf,
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(working_directory: impl AsRef<Path>) -> Self {
        let working_directory = working_directory.as_ref().to_path_buf();
        Self {
            root: working_directory.join(LIB_DIR),
            working_directory,
        }
    }

    /// The `lib` directory all kinds live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Opens a writer for `kind`/`file_name`.
    ///
    /// The kind directory is created (recursively) if absent. The
    /// destination is only replaced when the writer finishes.
    pub async fn create(&self, kind: &str, file_name: &str) -> Result<ArtifactWriter, StoreError> {
        let kind = sanitize_component(kind)?;
        let name = sanitize_component(file_name)?;
        let path = storage_path(&self.working_directory, kind, name)?;

        let dir = path.parent().unwrap_or(self.root.as_path());
        create_dir(dir).await?;
        let sink = PartialFile::create_in(dir)?;

        debug!(path = %path.display(), "artifact destination opened");

        Ok(ArtifactWriter {
            sink,
            kind: kind.to_string(),
            name: name.to_string(),
            path,
        })
    }

    /// Starts an artifact whose kind is not known yet.
    ///
    /// The bytes go to a temporary file under the storage root; hand the
    /// spool to [`commit`](Self::commit) once the kind is known.
    pub async fn spool(&self) -> Result<Spool, StoreError> {
        create_dir(&self.root).await?;
        let sink = PartialFile::create_in(&self.root)?;
        debug!(path = %sink.temp.display(), "spooling artifact");
        Ok(Spool { sink })
    }

    /// Moves a spooled artifact to its place under `kind`/`file_name`.
    pub async fn commit(
        &self,
        spool: Spool,
        kind: &str,
        file_name: &str,
    ) -> Result<StoredArtifact, StoreError> {
        let kind = sanitize_component(kind)?;
        let name = sanitize_component(file_name)?;
        let path = storage_path(&self.working_directory, kind, name)?;
        create_dir(path.parent().unwrap_or(self.root.as_path())).await?;

        let (size, sha256) = spool.sink.persist(&path).await?;
        Ok(StoredArtifact {
            kind: kind.to_string(),
            name: name.to_string(),
            path,
            size,
            sha256,
        })
    }

    /// Stores an in-memory payload in one go.
    pub async fn store_bytes(
        &self,
        kind: &str,
        file_name: &str,
        data: &[u8],
    ) -> Result<StoredArtifact, StoreError> {
        let mut writer = self.create(kind, file_name).await?;
        writer.write(data).await?;
        writer.finish().await
    }
}

async fn create_dir(dir: &Path) -> Result<(), StoreError> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(crate::DIR_MODE);
    builder
        .create(dir)
        .await
        .map_err(|source| StoreError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
}

/// A hashed temporary file, deleted on drop unless persisted.
struct PartialFile {
    file: File,
    temp: TempPath,
    hasher: Sha256,
    size: u64,
}

impl PartialFile {
    fn create_in(dir: &Path) -> Result<Self, StoreError> {
        let open_failed = |source| StoreError::Open {
            path: dir.to_path_buf(),
            source,
        };

        let named = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(dir)
            .map_err(open_failed)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            named
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(crate::FILE_MODE))
                .map_err(open_failed)?;
        }

        let (file, temp) = named.into_parts();
        Ok(Self {
            file: File::from_std(file),
            temp,
            hasher: Sha256::new(),
            size: 0,
        })
    }

    async fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.file.write_all(data).await?;
        self.hasher.update(data);
        self.size += data.len() as u64;
        Ok(())
    }

    /// Flushes and renames onto `path`, returning size and hex digest.
    async fn persist(self, path: &Path) -> Result<(u64, String), StoreError> {
        let write_failed = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        let Self {
            mut file,
            temp,
            hasher,
            size,
        } = self;
        file.flush().await.map_err(write_failed)?;
        drop(file);
        temp.persist(path).map_err(|e| write_failed(e.error))?;

        Ok((size, hex::encode(hasher.finalize())))
    }
}

/// Streams one artifact to disk, hashing as it goes.
pub struct ArtifactWriter {
    sink: PartialFile,
    kind: String,
    name: String,
    path: PathBuf,
}

impl ArtifactWriter {
    /// Appends `data` to the artifact.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), StoreError> {
        self.sink
            .write(data)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }

    /// Moves the finished file into place and returns its record.
    pub async fn finish(self) -> Result<StoredArtifact, StoreError> {
        let (size, sha256) = self.sink.persist(&self.path).await?;
        Ok(StoredArtifact {
            kind: self.kind,
            name: self.name,
            path: self.path,
            size,
            sha256,
        })
    }
}

/// An artifact being received before its kind is known.
pub struct Spool {
    sink: PartialFile,
}

impl Spool {
    /// Appends `data` to the spooled artifact.
    pub async fn write(&mut self, data: &[u8]) -> Result<(), StoreError> {
        self.sink
            .write(data)
            .await
            .map_err(|source| StoreError::Write {
                path: self.sink.temp.to_path_buf(),
                source,
            })
    }
}

//! Engine registry seam.
//!
//! The receiver records every stored artifact through a [`Registry`]. Real
//! deployments back it with a datastore; [`MemoryRegistry`] keeps records
//! in process.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::sync::Mutex;

use crate::auth::Principal;

/// A boxed future returned by registry methods.
pub type RegistryFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Identifier assigned to a registered engine.
pub type EngineId = i64;

/// Registry rejection. The message is returned to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RegistryError(pub String);

/// Records stored artifacts.
///
/// Implementations are shared by every in-flight upload and must
/// serialize their own writes.
pub trait Registry: Send + Sync + 'static {
    /// Registers the artifact stored at `path` under `name` for `principal`.
    fn add_engine<'a>(
        &'a self,
        principal: &'a Principal,
        name: &'a str,
        path: &'a Path,
    ) -> RegistryFuture<'a, Result<EngineId, RegistryError>>;
}

/// One registered engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRecord {
    pub id: EngineId,
    pub principal: Principal,
    pub name: String,
    pub path: PathBuf,
}

/// In-process registry. Ids start at 1.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    records: Mutex<Vec<EngineRecord>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every registered engine, oldest first.
    pub async fn engines(&self) -> Vec<EngineRecord> {
        self.records.lock().await.clone()
    }
}

impl Registry for MemoryRegistry {
    fn add_engine<'a>(
        &'a self,
        principal: &'a Principal,
        name: &'a str,
        path: &'a Path,
    ) -> RegistryFuture<'a, Result<EngineId, RegistryError>> {
        Box::pin(async move {
            let mut records = self.records.lock().await;
            let id = records.len() as EngineId + 1;
            records.push(EngineRecord {
                id,
                principal: principal.clone(),
                name: name.to_string(),
                path: path.to_path_buf(),
            });
            tracing::debug!(id, name, principal = %principal, "engine registered");
            Ok(id)
        })
    }
}

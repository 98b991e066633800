//! Artifact upload receiver for the EngineDock master.
//!
//! Serves `POST /upload`: the caller is identified through an
//! [`Identifier`], the multipart `file` field is written under
//! `<working dir>/lib/<kind>/`, and the stored file is recorded through a
//! [`Registry`].

mod auth;
mod registry;
mod server;
mod upload;

pub use auth::{AllowAll, AuthError, Identifier, Principal, TokenIdentifier};
pub use registry::{
    EngineId, EngineRecord, MemoryRegistry, Registry, RegistryError, RegistryFuture,
};
pub use server::{Receiver, ReceiverConfig};
pub use upload::UploadError;

/// Errors produced while running the receiver server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server already running")]
    AlreadyRunning,
}

//! File operations for artifact storage and local path handling.
//!
//! Provides `~`-aware path resolution for the compile client and the
//! kind-keyed storage layout (`<working dir>/lib/<kind>/<name>`) used by the
//! receiver.

mod layout;
mod resolve;
mod store;

pub use layout::{sanitize_component, storage_path};
pub use resolve::{expand_home, resolve_path, resolve_sibling};
pub use store::{ArtifactStore, ArtifactWriter, Spool, StoreError, StoredArtifact};

/// Permission bits for directories created under the storage root.
pub const DIR_MODE: u32 = 0o755;

/// Permission bits for stored artifact files.
pub const FILE_MODE: u32 = 0o644;

/// Returns the user's home directory.
fn home_dir() -> std::path::PathBuf {
    std::env::var("HOME")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("/tmp"))
}

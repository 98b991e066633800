//! Receiver HTTP server.
//!
//! Binds a TCP listener and serves the upload route with axum. Every
//! connection is handled on its own task; uploads share nothing but the
//! registry.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use enginedock_file_ops::ArtifactStore;
use enginedock_protocol::UPLOAD_PATH;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::auth::Identifier;
use crate::registry::Registry;
use crate::upload::{self, UploadState};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Address to listen on (port 0 = OS-assigned).
    pub listen: SocketAddr,
    /// Artifacts are stored under `<working_directory>/lib`.
    pub working_directory: PathBuf,
    /// Maximum request body size. `None` leaves the limit to the transport.
    pub body_limit: Option<usize>,
}

impl ReceiverConfig {
    pub fn new(working_directory: impl Into<PathBuf>) -> Self {
        Self {
            listen: ([127, 0, 0, 1], 0).into(),
            working_directory: working_directory.into(),
            body_limit: None,
        }
    }
}

/// The master's artifact upload server.
pub struct Receiver {
    config: ReceiverConfig,
    state: Arc<UploadState>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
    running: AtomicBool,
}

impl Receiver {
    /// Creates a receiver storing under the configured working directory.
    pub fn new<I, R>(config: ReceiverConfig, identifier: I, registry: Arc<R>) -> Arc<Self>
    where
        I: Identifier,
        R: Registry,
    {
        let state = UploadState {
            store: ArtifactStore::new(&config.working_directory),
            identifier: Arc::new(identifier),
            registry,
        };

        Arc::new(Self {
            config,
            state: Arc::new(state),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available once [`run`](Self::run) or [`serve`](Self::serve)
    /// has a listener.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Builds the axum router serving the upload route.
    pub fn router(&self) -> Router {
        let body_limit = match self.config.body_limit {
            Some(max) => DefaultBodyLimit::max(max),
            None => DefaultBodyLimit::disable(),
        };

        Router::new()
            .route(UPLOAD_PATH, post(upload::upload))
            .layer(body_limit)
            .with_state(Arc::clone(&self.state))
    }

    /// Gracefully shuts down the server.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Binds the configured address and serves until [`shutdown`](Self::shutdown).
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.listen).await?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until [`shutdown`](Self::shutdown).
    pub async fn serve(self: &Arc<Self>, listener: TcpListener) -> Result<(), ServerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!(
            working_directory = %self.config.working_directory.display(),
            "receiver listening on {local_addr}"
        );

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned())
            .await;

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("receiver shut down");
        result.map_err(ServerError::from)
    }
}

//! Wires the receiver to its collaborators and runs it until shutdown.

use std::sync::Arc;

use enginedock_receiver::{MemoryRegistry, Receiver, TokenIdentifier};

use crate::config::Config;

/// Runs the master until Ctrl-C or a server failure.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let receiver_config = config.receiver_config()?;

    let identifier = TokenIdentifier::new(config.tokens.clone());
    if identifier.is_empty() {
        tracing::warn!("no upload tokens configured; every upload will be rejected");
    }

    let registry = Arc::new(MemoryRegistry::new());
    let receiver = Receiver::new(receiver_config, identifier, Arc::clone(&registry));

    let server = Arc::clone(&receiver);
    let mut server_task = tokio::spawn(async move { server.run().await });

    tokio::select! {
        result = &mut server_task => {
            // The server only stops on its own when it fails.
            result??;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
        }
    }

    receiver.shutdown();
    server_task.await??;

    let engines = registry.engines().await;
    tracing::info!(registered = engines.len(), "engines registered this session");
    Ok(())
}

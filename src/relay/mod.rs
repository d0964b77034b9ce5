// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Relay core (component C7): orchestrates `EVENT`/`REQ`/`CLOSE` handling
//! over one accept loop and per-connection session tasks.
//!
//! Grounded on `InternalLocalRelay` in the teacher crate: a
//! `TcpListener::accept` loop racing a shutdown broadcast, spawning one
//! task per connection.

pub mod builder;
mod session;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub use self::builder::RelayBuilder;
use crate::config::RelayConfig;
use crate::error::Error;
use crate::registry::SubscriptionRegistry;
use crate::store::EventStore;

/// A running (or not-yet-started) relay: shared store, shared subscription
/// registry, and configuration. Cheap to clone via `Arc` and share across
/// connection tasks.
pub struct Relay {
    config: RelayConfig,
    store: Arc<dyn EventStore>,
    registry: SubscriptionRegistry,
    default_backfill_limit: usize,
    next_conn_id: AtomicU64,
}

impl Relay {
    pub(crate) fn new(config: RelayConfig, store: Arc<dyn EventStore>) -> Self {
        let default_backfill_limit = config.default_backfill_limit;
        Self {
            config,
            store,
            registry: SubscriptionRegistry::new(),
            default_backfill_limit,
            next_conn_id: AtomicU64::new(0),
        }
    }

    /// Bind the configured address and run the accept loop until
    /// `shutdown` fires. Each accepted connection is handled on its own
    /// spawned task; a failure in one never affects the others (§7).
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> Result<(), Error> {
        let addr = SocketAddr::new(self.config.addr, self.config.port);
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "relay listening");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    tracing::info!("relay shutting down");
                    return Ok(());
                }

                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(err) => {
                            tracing::warn!(?err, "accept failed");
                            continue;
                        }
                    };

                    let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(%peer, conn_id, "connection accepted");

                    let relay = Arc::clone(&self);
                    let conn_shutdown = shutdown.resubscribe();
                    tokio::spawn(async move {
                        session::handle_connection(relay, stream, conn_id, conn_shutdown).await;
                    });
                }
            }
        }
    }

    /// The locally bound address this relay is configured for (before or
    /// after `run` is called).
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.config.addr, self.config.port)
    }
}

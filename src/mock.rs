// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! A relay running on a random loopback port, for end-to-end tests.
//!
//! Grounded on the teacher's `MockRelay`/`InternalMockRelay`: find a free
//! port, spawn the accept loop on it, expose the resulting `ws://` URL,
//! and tear the listener down on shutdown.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::error::Error;
use crate::relay::{Relay, RelayBuilder};

/// A relay bound to an ephemeral loopback port, running on its own spawned
/// task until dropped or explicitly shut down.
pub struct MockRelay {
    addr: SocketAddr,
    shutdown: broadcast::Sender<()>,
}

impl MockRelay {
    /// Find a free loopback port, build a relay on it with an empty
    /// in-memory store, and start serving connections.
    pub async fn run() -> Result<Self, Error> {
        let port = find_available_port().await?;
        let relay: Relay = RelayBuilder::new()
            .addr(Ipv4Addr::LOCALHOST.into())
            .port(port)
            .build();
        let addr = relay.addr();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let relay = Arc::new(relay);
        tokio::spawn(async move {
            if let Err(err) = relay.run(shutdown_rx).await {
                tracing::error!(?err, "mock relay terminated with an error");
            }
        });

        Ok(Self {
            addr,
            shutdown: shutdown_tx,
        })
    }

    /// The `ws://` URL clients should connect to.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Stop accepting connections and tear down the listener task.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }
}

impl Drop for MockRelay {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn find_available_port() -> Result<u16, Error> {
    for port in 8000..u16::MAX {
        if port_is_available(port).await {
            return Ok(port);
        }
    }
    Err(Error::NoPortAvailable)
}

async fn port_is_available(port: u16) -> bool {
    TcpListener::bind(SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)))
        .await
        .is_ok()
}

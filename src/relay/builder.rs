// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Chained-setter construction of a [`Relay`](super::Relay), in the style
//! of the teacher crate's own `RelayBuilder`.

use std::net::IpAddr;
use std::sync::Arc;

use crate::config::RelayConfig;
use crate::store::{EventStore, MemoryStore};

/// Builds a [`super::Relay`].
pub struct RelayBuilder {
    config: RelayConfig,
    store: Arc<dyn EventStore>,
}

impl Default for RelayBuilder {
    fn default() -> Self {
        Self {
            config: RelayConfig::default(),
            store: Arc::new(MemoryStore::new()),
        }
    }
}

impl RelayBuilder {
    /// Start from defaults: loopback, port 7777, an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn addr(mut self, addr: IpAddr) -> Self {
        self.config.addr = addr;
        self
    }

    /// Set the bind port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the default backfill cap used when a `REQ` omits `limit`.
    pub fn default_backfill_limit(mut self, limit: usize) -> Self {
        self.config.default_backfill_limit = limit;
        self
    }

    /// Swap in a different event store backend.
    pub fn store(mut self, store: Arc<dyn EventStore>) -> Self {
        self.store = store;
        self
    }

    /// Build the relay, ready to [`super::Relay::run`].
    pub fn build(self) -> super::Relay {
        super::Relay::new(self.config, self.store)
    }
}

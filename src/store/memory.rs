// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! In-memory event store.
//!
//! The only backend this crate ships (§1: the storage backend is an
//! external collaborator). Grounded on the shape of the teacher's
//! `MemoryDatabase` (an `Arc<Mutex<..>>`-guarded collection behind a
//! `with_opts`-style constructor) but without its LRU "seen" cache or
//! negentropy indexing, neither of which this spec's scope needs.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EventStore, StoreError};
use crate::event::{Event, EventId};
use crate::filter::{self, Filter};
use crate::keys::PublicKey;

/// An in-memory, process-local event store.
#[derive(Default)]
pub struct MemoryStore {
    events: RwLock<Vec<Event>>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert(&self, event: Event) -> Result<(), StoreError> {
        let mut events = self.events.write().await;

        if event.kind().is_replaceable() {
            events.retain(|e| !(e.pubkey() == event.pubkey() && e.kind() == event.kind()));
        } else if event.kind() == crate::event::Kind::DELETION {
            let author = event.pubkey();
            let targets: Vec<String> = event.referenced_event_ids().map(str::to_owned).collect();
            events.retain(|e| {
                !(e.pubkey() == author && targets.iter().any(|t| e.id().to_hex() == *t))
            });
        }

        events.push(event);
        Ok(())
    }

    async fn query(&self, filters: &[Filter], default_limit: usize) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().await;

        let mut matched: Vec<&Event> = events
            .iter()
            .filter(|event| filter::matches_any(filters, event))
            .collect();

        matched.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().to_hex().cmp(&b.id().to_hex()))
        });

        let limit = filters
            .iter()
            .find_map(|f| f.limit)
            .map(|l| l.min(default_limit))
            .unwrap_or(default_limit);

        matched.truncate(limit);
        Ok(matched.into_iter().cloned().collect())
    }

    async fn delete_by_id(&self, id: &EventId, author: &PublicKey) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        events.retain(|e| !(e.id() == *id && e.pubkey() == *author));
        Ok(())
    }
}

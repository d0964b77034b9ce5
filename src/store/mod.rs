// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Event persistence (component C5).

mod memory;

pub use self::memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::event::{Event, EventId};
use crate::filter::Filter;

/// Store-layer failure. Scoped to a single operation: a `StoreError` aborts
/// only the current `EVENT`'s transaction (§7), the relay stays up.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed in a way the relay can't recover from inline
    #[error("store backend error: {0}")]
    Backend(String),
}

/// What the relay core requires of its backend (§6, §4.5).
///
/// Implementations MUST apply the pre-insert deletions of `insert` and the
/// append atomically: a crash or error between the two is forbidden from
/// being observable (no state where old metadata is gone but new metadata
/// never landed).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Apply the replace-on-kind / NIP-09 pre-insert deletions dictated by
    /// `event.kind()`, then append `event`, as a single atomic unit.
    async fn insert(&self, event: Event) -> Result<(), StoreError>;

    /// Up to `limit` events (or `default_limit` if `limit` is absent)
    /// satisfying any of `filters`, most-recent-first, ties broken by id
    /// ascending (§4.5).
    async fn query(&self, filters: &[Filter], default_limit: usize) -> Result<Vec<Event>, StoreError>;

    /// Delete the stored event `id` iff it is authored by `author`.
    /// Used directly by NIP-09 processing inside `insert`, and exposed on
    /// the trait so alternative backends can implement it without
    /// reimplementing `insert`'s whole transaction.
    async fn delete_by_id(&self, id: &EventId, author: &crate::keys::PublicKey) -> Result<(), StoreError>;
}

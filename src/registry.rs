// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Subscription registry (component C6).
//!
//! Tracks live subscriptions keyed by connection and fans out broadcasts.
//! The broadcast/removal ordering is grounded directly on the original
//! relay's subscription pool: collect the connections whose send failed
//! while still holding the registry lock, then drop them only after the
//! full iteration completes — removing mid-iteration would invalidate the
//! snapshot broadcast is iterating over.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};

use crate::event::Event;
use crate::filter::Filter;
use crate::message::RelayMessage;

/// Opaque handle identifying a connection. The registry never inspects it;
/// it only uses it as a map key and as the destination of a send.
pub type ConnectionId = u64;

struct Subscription {
    subscription_id: String,
    filters: Vec<Filter>,
    sender: mpsc::UnboundedSender<RelayMessage>,
}

/// Registry of live subscriptions. At most one subscription per connection,
/// matching the source's one-REQ-per-connection model (§4.6, §9): a second
/// REQ on the same connection replaces the first.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: RwLock<HashMap<ConnectionId, Subscription>>,
}

impl SubscriptionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach (or replace) the subscription bound to `conn`.
    pub async fn add(
        &self,
        conn: ConnectionId,
        subscription_id: String,
        filters: Vec<Filter>,
        sender: mpsc::UnboundedSender<RelayMessage>,
    ) {
        let mut subs = self.subscriptions.write().await;
        subs.insert(
            conn,
            Subscription {
                subscription_id,
                filters,
                sender,
            },
        );
    }

    /// Drop the subscription bound to `conn`, if any. Used for `CLOSE` and
    /// for disconnect cleanup.
    pub async fn remove(&self, conn: ConnectionId) {
        let mut subs = self.subscriptions.write().await;
        subs.remove(&conn);
    }

    /// Send `event` to every subscription whose filter set admits it.
    ///
    /// Holds the lock for the whole snapshot-and-send pass so concurrent
    /// add/remove cannot interleave with the traversal; connections whose
    /// send fails (a dropped or full channel) are collected as stale and
    /// removed only once the iteration is over.
    pub async fn broadcast(&self, event: &Event) {
        let mut stale = Vec::new();

        {
            let subs = self.subscriptions.read().await;
            for (&conn, sub) in subs.iter() {
                if !crate::filter::matches_any(&sub.filters, event) {
                    continue;
                }
                let msg = RelayMessage::event(sub.subscription_id.clone(), event.clone());
                if sub.sender.send(msg).is_err() {
                    stale.push(conn);
                }
            }
        }

        if !stale.is_empty() {
            let mut subs = self.subscriptions.write().await;
            for conn in stale {
                subs.remove(&conn);
            }
        }
    }
}

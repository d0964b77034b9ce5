// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Event kind

use serde::{Deserialize, Serialize};

/// An event's kind: an integer that classifies its purpose.
///
/// Well-known values are exposed as associated constants rather than enum
/// variants so that arbitrary/future kinds round-trip without a catch-all
/// variant losing information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(u64);

impl Kind {
    /// `0` — replaces the author's prior metadata event
    pub const METADATA: Kind = Kind(0);
    /// `1` — plain text note
    pub const TEXT_NOTE: Kind = Kind(1);
    /// `2` — recommend a relay to other clients
    pub const RECOMMEND_SERVER: Kind = Kind(2);
    /// `3` — replaces the author's prior contact list event
    pub const CONTACT_LIST: Kind = Kind(3);
    /// `5` — requests deletion of events referenced in its `e` tags
    pub const DELETION: Kind = Kind(5);

    /// Wrap a raw integer kind.
    pub const fn new(kind: u64) -> Self {
        Self(kind)
    }

    /// The raw integer value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Whether the store keeps at most one event of this kind per author.
    pub const fn is_replaceable(self) -> bool {
        matches!(self, Kind::METADATA | Kind::CONTACT_LIST)
    }
}

impl From<u64> for Kind {
    fn from(kind: u64) -> Self {
        Self(kind)
    }
}

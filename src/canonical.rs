// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Canonical serialization of an event's signable fields.
//!
//! The only function in this crate whose output matters bit-exactly: its
//! bytes are hashed to produce an event's id, and the hex of that hash is
//! what gets Schnorr-signed.

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::event::Kind;

/// Produce the canonical `[0,pubkey,created_at,kind,tags,content]` byte
/// sequence: no whitespace, non-ASCII left as raw UTF-8, shortest-form
/// integers. `serde_json`'s compact `Value` serializer already satisfies
/// all three; this function exists to pin the exact field order and count.
pub fn serialize(pubkey_hex: &str, created_at: u64, kind: Kind, tags: &[Vec<String>], content: &str) -> String {
    let value = json!([0, pubkey_hex, created_at, kind.as_u64(), tags, content]);
    value.to_string()
}

/// SHA-256 of the canonical serialization, as raw bytes.
pub fn compute_id(pubkey_hex: &str, created_at: u64, kind: Kind, tags: &[Vec<String>], content: &str) -> [u8; 32] {
    let preimage = serialize(pubkey_hex, created_at, kind, tags, content);
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    hasher.finalize().into()
}

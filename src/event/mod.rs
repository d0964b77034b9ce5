// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Event parsing, id computation and signature verification (component C3).

mod id;
mod kind;
mod tag;

pub use self::id::EventId;
pub use self::kind::Kind;
pub use self::tag::Tag;

use serde::Serialize;
use serde_json::Value;

use crate::canonical;
use crate::error::ValidationError;
use crate::keys::{self, PublicKey, Sig};

/// A validated, immutable event.
///
/// The only way to construct one is [`Event::parse`], which recomputes the
/// id and verifies the signature — there is no constructor that takes a
/// caller-supplied id on trust.
#[derive(Debug, Clone)]
pub struct Event {
    id: EventId,
    pubkey: PublicKey,
    created_at: u64,
    kind: Kind,
    tags: Vec<Tag>,
    content: String,
    sig: Sig,
}

impl Event {
    /// Parse and validate a wire event object.
    ///
    /// Algorithm (§4.3): extract and type-check fields, normalize tags,
    /// recompute the id from the canonical serialization, then require the
    /// signature to verify against that id. A client-supplied `id` field,
    /// if present, is read but never trusted — the computed value always
    /// wins, matching lax clients whose echoed id drifted.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        Self::parse_inner(value).map_err(|(err, _id)| err)
    }

    /// Like [`Event::parse`], but on failure also returns the id computed
    /// from the fields that *did* parse, when enough of them did — used to
    /// pick the `OK` failure-path id (SPEC_FULL §C.1) without recomputing
    /// the canonical serialization a second time.
    pub fn parse_with_best_effort_id(value: &Value) -> Result<Self, (ValidationError, Option<EventId>)> {
        Self::parse_inner(value)
    }

    fn parse_inner(value: &Value) -> Result<Self, (ValidationError, Option<EventId>)> {
        let fail = |err: ValidationError| (err, None);

        let obj = value
            .as_object()
            .ok_or_else(|| fail(ValidationError::MissingField("event")))?;

        let pubkey_str = obj
            .get("pubkey")
            .and_then(Value::as_str)
            .ok_or_else(|| fail(ValidationError::MissingField("pubkey")))?;
        let pubkey = PublicKey::from_hex(pubkey_str).map_err(fail)?;

        let created_at = obj
            .get("created_at")
            .and_then(Value::as_u64)
            .ok_or_else(|| fail(ValidationError::MissingField("created_at")))?;

        let kind = obj
            .get("kind")
            .and_then(Value::as_u64)
            .ok_or_else(|| fail(ValidationError::MissingField("kind")))?;
        let kind = Kind::new(kind);

        let tags_value = obj
            .get("tags")
            .and_then(Value::as_array)
            .ok_or_else(|| fail(ValidationError::MissingField("tags")))?;
        let mut tags = Vec::with_capacity(tags_value.len());
        let mut raw_tags = Vec::with_capacity(tags_value.len());
        for entry in tags_value {
            let entry = entry
                .as_array()
                .ok_or_else(|| fail(ValidationError::UnknownTagShape))?
                .iter()
                .map(|v| v.as_str().map(str::to_owned).ok_or(ValidationError::UnknownTagShape))
                .collect::<Result<Vec<String>, ValidationError>>()
                .map_err(fail)?;
            raw_tags.push(entry.clone());
            tags.push(Tag::parse(entry).map_err(fail)?);
        }

        let content = obj
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| fail(ValidationError::MissingField("content")))?
            .to_owned();

        let sig_str = obj
            .get("sig")
            .and_then(Value::as_str)
            .ok_or_else(|| fail(ValidationError::MissingField("sig")))?;
        let sig = Sig::from_hex(sig_str).map_err(fail)?;

        // Every field needed for the canonical serialization parsed: an id
        // is now computable regardless of what happens next.
        let id_bytes = canonical::compute_id(pubkey_str, created_at, kind, &raw_tags, &content);
        let computed_id = EventId::from_bytes(id_bytes);

        if !keys::verify(&pubkey, &id_bytes, &sig) {
            return Err((ValidationError::InvalidSignature, Some(computed_id)));
        }

        Ok(Self {
            id: computed_id,
            pubkey,
            created_at,
            kind,
            tags,
            content,
            sig,
        })
    }

    /// The (recomputed, authoritative) event id.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// The author's public key.
    pub fn pubkey(&self) -> PublicKey {
        self.pubkey
    }

    /// Unix timestamp, seconds.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// The event's kind.
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Tag entries, in original order.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// The content string.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Event ids referenced by this event's `e` tags (for NIP-09 and `#e`
    /// filter matching).
    pub fn referenced_event_ids(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().filter_map(Tag::event_id)
    }

    /// Pubkeys referenced by this event's `p` tags (for `#p` filter
    /// matching).
    pub fn referenced_pubkeys(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().filter_map(Tag::pubkey)
    }
}

impl Serialize for Event {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let raw_tags: Vec<&[String]> = self.tags.iter().map(Tag::as_slice).collect();
        let mut state = serializer.serialize_struct("Event", 7)?;
        state.serialize_field("id", &self.id.to_hex())?;
        state.serialize_field("pubkey", &self.pubkey.to_hex())?;
        state.serialize_field("created_at", &self.created_at)?;
        state.serialize_field("kind", &self.kind.as_u64())?;
        state.serialize_field("tags", &raw_tags)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("sig", &self.sig.to_hex())?;
        state.end()
    }
}

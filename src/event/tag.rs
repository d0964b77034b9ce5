// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Tag entries.
//!
//! A tag is, on the wire, just an array of strings. The relay parses a
//! recognized discriminant (`e`, `p`) out of the first element for
//! indexing and filter matching, but always keeps the original array
//! around so round-tripping never drops data — including for tag names
//! the relay doesn't recognize.

use crate::error::ValidationError;

/// The parsed meaning of a tag's first element, when recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    /// `["e", <event id>, <recommended relay url>?]`
    Event,
    /// `["p", <pubkey>, <recommended relay url>?]`
    Pubkey,
    /// Any other tag name
    Other,
}

/// One tag entry: the raw array as received, plus its parsed kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    raw: Vec<String>,
    kind: TagKind,
}

impl Tag {
    /// Parse a raw tag array. Rejects only the empty array (no tag name at
    /// all) or entries whose name is `e`/`p` but missing the value that
    /// follows it — everything else, including unrecognized names, is
    /// accepted and preserved verbatim.
    pub fn parse(raw: Vec<String>) -> Result<Self, ValidationError> {
        let name = raw.first().ok_or(ValidationError::UnknownTagShape)?;
        let kind = match name.as_str() {
            "e" if raw.len() >= 2 => TagKind::Event,
            "p" if raw.len() >= 2 => TagKind::Pubkey,
            "e" | "p" => return Err(ValidationError::UnknownTagShape),
            _ => TagKind::Other,
        };
        Ok(Self { raw, kind })
    }

    /// The original array, unmodified.
    pub fn as_slice(&self) -> &[String] {
        &self.raw
    }

    /// The tag name (first element).
    pub fn name(&self) -> &str {
        &self.raw[0]
    }

    /// The referenced event id, if this is an `e` tag.
    pub fn event_id(&self) -> Option<&str> {
        matches!(self.kind, TagKind::Event).then(|| self.raw[1].as_str())
    }

    /// The referenced pubkey, if this is a `p` tag.
    pub fn pubkey(&self) -> Option<&str> {
        matches!(self.kind, TagKind::Pubkey).then(|| self.raw[1].as_str())
    }
}

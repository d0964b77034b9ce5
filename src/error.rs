// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! Crate-wide error types

use std::io;

use thiserror::Error;

use crate::store::StoreError;

/// Top-level error, returned by operations that are not scoped to a single
/// client session (binding the listener, loading configuration, ...).
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error(transparent)]
    IO(#[from] io::Error),
    /// Event store error
    #[error(transparent)]
    Store(#[from] StoreError),
    /// No port available in the configured range
    #[error("no port available")]
    NoPortAvailable,
}

/// Why an incoming `EVENT` failed validation (C3).
///
/// Never propagated as a Rust error to other clients: converted to an
/// `OK ... false <reason>` reply on the originating connection only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or had the wrong JSON type
    #[error("missing or malformed field: {0}")]
    MissingField(&'static str),
    /// A field expected to be hex was not valid hex
    #[error("invalid hex in field: {0}")]
    BadHex(&'static str),
    /// A hex field had the wrong decoded byte length
    #[error("invalid length for field: {0}")]
    BadLength(&'static str),
    /// A tag entry was present but not a non-empty array of strings
    #[error("tag entry has an invalid shape")]
    UnknownTagShape,
    /// Signature did not verify against the computed id and declared pubkey
    #[error("signature verification failed")]
    InvalidSignature,
}

/// Frame-level error: the message did not parse as a known client command.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame was not valid JSON
    #[error("invalid JSON")]
    InvalidJson,
    /// The frame did not start with a recognized command string
    #[error("unknown command")]
    UnknownCommand,
    /// The frame's shape didn't match its command (wrong arity/types)
    #[error("malformed {0} frame")]
    MalformedFrame(&'static str),
}

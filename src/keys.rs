// Copyright (c) 2024 nostr-relay Contributors
// Distributed under the MIT software license

//! BIP-340 Schnorr signing and verification over secp256k1, plus the hex
//! codec for keys, ids and signatures.

use std::fmt;
use std::str::FromStr;

use secp256k1::rand::rngs::OsRng;
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Message, Secp256k1, XOnlyPublicKey};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A 32-byte x-only secp256k1 public key, the author identity used throughout
/// the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey(XOnlyPublicKey);

impl PublicKey {
    /// Parse from 64 hex chars.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(s).map_err(|_| ValidationError::BadHex("pubkey"))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ValidationError::BadLength("pubkey"))?;
        XOnlyPublicKey::from_slice(&array)
            .map(Self)
            .map_err(|_| ValidationError::BadHex("pubkey"))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(self) -> String {
        hex::encode(self.0.serialize())
    }

    /// Raw 32 bytes.
    pub fn as_bytes(&self) -> [u8; 32] {
        self.0.serialize()
    }

    fn inner(&self) -> XOnlyPublicKey {
        self.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PublicKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

/// A 64-byte BIP-340 Schnorr signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sig(Signature);

impl Sig {
    /// Parse from 128 hex chars.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(s).map_err(|_| ValidationError::BadHex("sig"))?;
        if bytes.len() != 64 {
            return Err(ValidationError::BadLength("sig"));
        }
        Signature::from_slice(&bytes)
            .map(Self)
            .map_err(|_| ValidationError::BadHex("sig"))
    }

    /// Lowercase hex encoding.
    pub fn to_hex(self) -> String {
        hex::encode(self.0.as_ref())
    }
}

/// A signing keypair: secret key plus its derived x-only public key.
///
/// Mirrors the shape of the teacher crate's key type without the
/// capability-negotiation machinery (NIP-04/44 encryption) the relay
/// itself never needs — the relay only ever verifies, it never holds a
/// client's secret key. `Keys` exists for tests and for the key-generation
/// path of the CLI.
#[derive(Clone)]
pub struct Keys {
    key_pair: Keypair,
    public_key: PublicKey,
}

impl Keys {
    /// Generate a fresh random keypair, seeded from the OS CSPRNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let key_pair = Keypair::new(&secp, &mut OsRng);
        let public_key = XOnlyPublicKey::from_keypair(&key_pair).0;
        Self {
            key_pair,
            public_key: PublicKey(public_key),
        }
    }

    /// The derived public key.
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Sign a 32-byte message (the event id bytes) with BIP-340 Schnorr.
    pub fn sign_schnorr(&self, message: &[u8; 32]) -> Sig {
        let secp = Secp256k1::new();
        let msg = Message::from_slice(message).expect("message is exactly 32 bytes");
        Sig(secp.sign_schnorr_with_rng(&msg, &self.key_pair, &mut OsRng))
    }
}

/// Verify a BIP-340 Schnorr signature over a 32-byte message under a
/// public key. Never errors: an invalid signature is simply `false`.
pub fn verify(pubkey: &PublicKey, message: &[u8; 32], sig: &Sig) -> bool {
    let secp = Secp256k1::new();
    let msg = match Message::from_slice(message) {
        Ok(msg) => msg,
        Err(_) => return false,
    };
    secp.verify_schnorr(&sig.0, &msg, &pubkey.inner()).is_ok()
}

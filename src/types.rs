//! Core types for the store ledger
//!
//! All types are designed for:
//! - Deterministic addressing (owner key → account address)
//! - Append-only growth (entries are never mutated or removed)
//! - Exact persisted layout (see `codec`)

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Owner identity: the Ed25519 public key of the external principal that
/// exclusively controls one store account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId([u8; 32]);

impl OwnerId {
    /// Create from raw public key bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Storage address computed deterministically from owner identity plus a
/// namespace tag. Used instead of an explicitly allocated identifier: the
/// address itself is the per-owner uniqueness mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreAddress([u8; 32]);

impl StoreAddress {
    /// Create from raw address bytes
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for StoreAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// One inventory movement record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// What was received (e.g. "Laptop")
    pub item: String,

    /// Free-form price text (e.g. "2000"); not parsed at this layer
    pub price: String,

    /// Number of units; signed, no range validation at this layer
    pub quantity: i64,

    /// Seconds since epoch, assigned by the confirming ledger's clock,
    /// never by the caller
    pub entry_timestamp: i64,
}

/// The sole persisted entity per owner: an ordered entry list plus the
/// disambiguation value that fixes which derived address variant backs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreAccount {
    /// Entries in append order; only ever grows
    pub entries: Vec<Entry>,

    /// Bump chosen at initialization; part of account identity thereafter
    pub bump: u8,
}

impl StoreAccount {
    /// Fresh account as written by `initialize`
    pub fn new(bump: u8) -> Self {
        Self {
            entries: Vec::new(),
            bump,
        }
    }
}

/// Ed25519 keypair for an owner identity.
///
/// Signing mechanics are an external concern; this exists so hosts and
/// tests can mint identities without a wallet provider.
#[derive(Debug)]
pub struct OwnerKeypair {
    signing_key: SigningKey,
}

impl OwnerKeypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&rand::random::<[u8; 32]>()),
        }
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// The owner identity this keypair controls
    pub fn owner_id(&self) -> OwnerId {
        OwnerId(self.signing_key.verifying_key().to_bytes())
    }
}

//! Store Ledger
//!
//! Append-only per-owner inventory ledger with deterministic addressing.
//!
//! # Architecture
//!
//! - **Deterministic Addressing**: owner key + namespace tag → account
//!   address; the address itself is the uniqueness mechanism
//! - **Single Writer**: one actor task serializes every commit
//! - **Append-Only**: entries are never modified or deleted
//! - **Confirmation-Aware Client**: submissions confirm, reject, or time
//!   out; the authoritative view is always a subsequent confirmed read
//!
//! # Invariants
//!
//! - One account per owner identity, created exactly once
//! - Entry order equals append order, for all time
//! - Entry timestamps come from the ledger clock, never from callers

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod actor;
pub mod address;
pub mod channel;
pub mod client;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod processor;
pub mod storage;
pub mod types;

// Re-exports
pub use address::{derive, derive_store_address, STORE_NAMESPACE};
pub use channel::{
    CommitChannel, ConfirmationLevel, ConfirmationStatus, InProcessChannel, Operation,
    OperationOutput, SubmissionHandle,
};
pub use client::StoreClient;
pub use clock::{LedgerClock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::InventoryLedger;
pub use metrics::Metrics;
pub use types::{Entry, OwnerId, OwnerKeypair, StoreAccount, StoreAddress};

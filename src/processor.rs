//! Instruction processor
//!
//! The state machine executing the three operations against a store
//! account: one-time initialization, append, and query. Preconditions are
//! checked here and surfaced as distinguishable errors; business-range
//! validation (negative quantity, empty text) is deliberately absent at
//! this layer.
//!
//! The append is a pure function of (current entries, new entry): the
//! processor introduces no read-modify-write race of its own. Total
//! ordering of commits is the actor's job (see `actor`).

use crate::{
    address,
    clock::LedgerClock,
    codec,
    error::{Error, Result},
    storage::Storage,
    types::{Entry, OwnerId, StoreAccount, StoreAddress},
};
use std::sync::Arc;

/// Executes initialize / record_incoming / check_store against storage.
pub struct Processor {
    storage: Arc<Storage>,
    clock: Arc<dyn LedgerClock>,
    max_account_bytes: usize,
}

impl Processor {
    /// Create a processor over storage with an injected ledger clock.
    ///
    /// `max_account_bytes` is the account's allocated capacity; appends
    /// that would encode past it are rejected.
    pub fn new(storage: Arc<Storage>, clock: Arc<dyn LedgerClock>, max_account_bytes: usize) -> Self {
        Self {
            storage,
            clock,
            max_account_bytes,
        }
    }

    /// One-time account creation at the owner's derived address.
    ///
    /// The supplied bump must match the derived one. A second call against
    /// an existing account fails with [`Error::AlreadyInitialized`] and
    /// leaves the stored account untouched; callers are expected to
    /// probe with [`Processor::check_store`] first rather than rely on a
    /// no-op here.
    pub fn initialize(&self, owner: &OwnerId, bump: u8) -> Result<StoreAddress> {
        let (address, derived) = address::derive_store_address(owner)?;
        if bump != derived {
            return Err(Error::BumpMismatch {
                derived,
                supplied: bump,
            });
        }

        if self.storage.contains_account(&address)? {
            return Err(Error::AlreadyInitialized(address));
        }

        self.storage.put_account(&address, &StoreAccount::new(bump))?;

        tracing::info!(owner = %owner, address = %address, bump, "store account initialized");

        Ok(address)
    }

    /// Append one entry to the owner's account.
    ///
    /// The entry timestamp comes from the injected clock, never from the
    /// caller. Returns the entry as committed.
    pub fn record_incoming(
        &self,
        owner: &OwnerId,
        item: String,
        price: String,
        quantity: i64,
    ) -> Result<Entry> {
        let (address, _) = address::derive_store_address(owner)?;

        let mut account = self
            .storage
            .get_account(&address)?
            .ok_or(Error::StoreNotInitialized(address))?;

        let entry = Entry {
            item,
            price,
            quantity,
            entry_timestamp: self.clock.unix_timestamp(),
        };
        account.entries.push(entry.clone());

        let needed = codec::encoded_len(&account);
        if needed > self.max_account_bytes {
            return Err(Error::AccountFull {
                needed,
                capacity: self.max_account_bytes,
            });
        }

        self.storage.put_account(&address, &account)?;

        tracing::debug!(
            address = %address,
            entries = account.entries.len(),
            "entry recorded"
        );

        Ok(entry)
    }

    /// Full entry sequence in append order.
    ///
    /// Fails with [`Error::StoreNotInitialized`] when the derived address
    /// was never initialized; this is the canonical probe clients use to
    /// decide whether `initialize` must run first. No mutation.
    pub fn check_store(&self, owner: &OwnerId) -> Result<Vec<Entry>> {
        let (address, _) = address::derive_store_address(owner)?;

        let account = self
            .storage
            .get_account(&address)?
            .ok_or(Error::StoreNotInitialized(address))?;

        Ok(account.entries)
    }
}

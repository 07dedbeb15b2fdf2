//! Ledger orchestration layer
//!
//! Ties storage, the processor actor, the commit channel, and the client
//! into one openable unit.
//!
//! # Example
//!
//! ```no_run
//! use store_ledger::{Config, InventoryLedger, OwnerKeypair};
//!
//! #[tokio::main]
//! async fn main() -> store_ledger::Result<()> {
//!     let ledger = InventoryLedger::open(Config::default()).await?;
//!     let owner = OwnerKeypair::generate().owner_id();
//!
//!     ledger.client().initialize_if_needed(&owner).await?;
//!     let entries = ledger.client().append(&owner, "Laptop", "2000", 10).await?;
//!     assert_eq!(entries.len(), 1);
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_processor_actor, ProcessorHandle},
    channel::{ConfirmationLevel, InProcessChannel},
    client::StoreClient,
    clock::{LedgerClock, SystemClock},
    config::Config,
    error::{Error, Result},
    metrics::Metrics,
    processor::Processor,
    storage::Storage,
};
use std::sync::Arc;
use std::time::Duration;

/// An opened inventory ledger: storage, single-writer actor, in-process
/// commit channel, and a confirmation-aware client.
pub struct InventoryLedger {
    client: StoreClient,
    handle: ProcessorHandle,
    storage: Arc<Storage>,
    metrics: Metrics,
}

impl InventoryLedger {
    /// Open with the system wall clock as the confirming time source
    pub async fn open(config: Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Open with an injected ledger clock.
    ///
    /// Hosts relaying an external confirming system supply its clock here
    /// so entry timestamps are never taken from callers.
    pub async fn open_with_clock(config: Config, clock: Arc<dyn LedgerClock>) -> Result<Self> {
        let metrics = Metrics::new().map_err(|e| Error::Other(e.to_string()))?;
        let storage = Arc::new(Storage::open(&config)?);

        let processor = Processor::new(storage.clone(), clock, config.account.max_account_bytes);
        let handle = spawn_processor_actor(processor, metrics.clone(), config.channel.mailbox_capacity);

        let channel = Arc::new(InProcessChannel::new(
            handle.clone(),
            Duration::from_millis(config.channel.confirmation_timeout_ms),
            metrics.clone(),
        ));
        let client = StoreClient::new(channel, ConfirmationLevel::Confirmed);

        Ok(Self {
            client,
            handle,
            storage,
            metrics,
        })
    }

    /// The confirmation-aware client for this ledger
    pub fn client(&self) -> &StoreClient {
        &self.client
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Approximate number of initialized accounts
    pub fn account_count(&self) -> Result<u64> {
        self.storage.approximate_accounts()
    }

    /// Shutdown the ledger's actor
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}

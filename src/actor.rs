//! Actor-based concurrency for the store ledger
//!
//! Single-writer pattern using Tokio actors: every operation flows through
//! one task's mailbox, which is the total-order commit log the append
//! guarantee relies on. No locks are taken over account state anywhere
//! else.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          ProcessorHandle (Clone)             │
//! │       Sends messages to actor mailbox        │
//! └──────────────────┬───────────────────────────┘
//!                    │ mpsc::channel (bounded)
//!                    ▼
//! ┌──────────────────────────────────────────────┐
//! │        ProcessorActor (single task)          │
//! │   initialize / record_incoming / check_store │
//! │                    │                         │
//! │                    ▼                         │
//! │           Storage (RocksDB)                  │
//! └──────────────────────────────────────────────┘
//! ```

use crate::{
    error::{Error, Result},
    metrics::Metrics,
    processor::Processor,
    types::{Entry, OwnerId, StoreAddress},
};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the processor actor
pub enum ProcessorMessage {
    /// One-time account creation
    Initialize {
        /// Owner whose account to create
        owner: OwnerId,
        /// Previously derived bump
        bump: u8,
        /// Reply channel
        response: oneshot::Sender<Result<StoreAddress>>,
    },

    /// Append one entry
    RecordIncoming {
        /// Owner whose account to append to
        owner: OwnerId,
        /// Item text
        item: String,
        /// Free-form price text
        price: String,
        /// Signed quantity
        quantity: i64,
        /// Reply channel
        response: oneshot::Sender<Result<Entry>>,
    },

    /// Read the full entry sequence
    CheckStore {
        /// Owner whose account to read
        owner: OwnerId,
        /// Reply channel
        response: oneshot::Sender<Result<Vec<Entry>>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that serializes all processor operations
pub struct ProcessorActor {
    processor: Processor,
    mailbox: mpsc::Receiver<ProcessorMessage>,
    metrics: Metrics,
}

impl ProcessorActor {
    /// Create new actor
    pub fn new(
        processor: Processor,
        mailbox: mpsc::Receiver<ProcessorMessage>,
        metrics: Metrics,
    ) -> Self {
        Self {
            processor,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                ProcessorMessage::Shutdown => break,
                _ => self.handle_message(msg),
            }
        }
        tracing::debug!("processor actor stopped");
    }

    fn handle_message(&mut self, msg: ProcessorMessage) {
        match msg {
            ProcessorMessage::Initialize {
                owner,
                bump,
                response,
            } => {
                let result = self.processor.initialize(&owner, bump);
                if result.is_ok() {
                    self.metrics.record_store_initialized();
                }
                let _ = response.send(result);
            }

            ProcessorMessage::RecordIncoming {
                owner,
                item,
                price,
                quantity,
                response,
            } => {
                let result = self.processor.record_incoming(&owner, item, price, quantity);
                if result.is_ok() {
                    self.metrics.record_entry_recorded();
                }
                let _ = response.send(result);
            }

            ProcessorMessage::CheckStore { owner, response } => {
                let result = self.processor.check_store(&owner);
                if result.is_ok() {
                    self.metrics.record_query_served();
                }
                let _ = response.send(result);
            }

            ProcessorMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct ProcessorHandle {
    sender: mpsc::Sender<ProcessorMessage>,
}

impl ProcessorHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<ProcessorMessage>) -> Self {
        Self { sender }
    }

    /// Initialize the owner's account
    pub async fn initialize(&self, owner: OwnerId, bump: u8) -> Result<StoreAddress> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ProcessorMessage::Initialize {
                owner,
                bump,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Append one entry to the owner's account
    pub async fn record_incoming(
        &self,
        owner: OwnerId,
        item: String,
        price: String,
        quantity: i64,
    ) -> Result<Entry> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ProcessorMessage::RecordIncoming {
                owner,
                item,
                price,
                quantity,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Read the owner's full entry sequence
    pub async fn check_store(&self, owner: OwnerId) -> Result<Vec<Entry>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ProcessorMessage::CheckStore {
                owner,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ProcessorMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the processor actor
pub fn spawn_processor_actor(
    processor: Processor,
    metrics: Metrics,
    mailbox_capacity: usize,
) -> ProcessorHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity); // Bounded channel for backpressure
    let actor = ProcessorActor::new(processor, rx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    ProcessorHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::storage::Storage;
    use crate::types::OwnerKeypair;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn spawn_test_actor() -> (ProcessorHandle, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let storage = Arc::new(Storage::open(&config).unwrap());
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let processor = Processor::new(storage, clock, config.account.max_account_bytes);
        let handle = spawn_processor_actor(processor, Metrics::new().unwrap(), 64);
        (handle, temp_dir)
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let (handle, _temp) = spawn_test_actor();
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_full_flow() {
        let (handle, _temp) = spawn_test_actor();
        let owner = OwnerKeypair::from_seed(&[11u8; 32]).owner_id();
        let (_, bump) = address::derive_store_address(&owner).unwrap();

        handle.initialize(owner, bump).await.unwrap();

        let entry = handle
            .record_incoming(owner, "Laptop".into(), "2000".into(), 10)
            .await
            .unwrap();
        assert_eq!(entry.entry_timestamp, 1_700_000_000);

        let entries = handle.check_store(owner).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item, "Laptop");

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_propagates_preconditions() {
        let (handle, _temp) = spawn_test_actor();
        let owner = OwnerKeypair::from_seed(&[12u8; 32]).owner_id();
        let (_, bump) = address::derive_store_address(&owner).unwrap();

        assert!(handle.check_store(owner).await.unwrap_err().is_not_initialized());

        handle.initialize(owner, bump).await.unwrap();
        assert!(handle
            .initialize(owner, bump)
            .await
            .unwrap_err()
            .is_already_initialized());

        handle.shutdown().await.unwrap();
    }
}

//! Commit/confirmation channel
//!
//! The client never calls the processor directly; it submits operations to
//! a channel and later awaits one of three terminal signals: confirmed,
//! rejected, or timed out. The channel is an opaque asynchronous
//! dependency: a production deployment fronts a remote commit log, and
//! [`InProcessChannel`] here fronts the single-writer actor.
//!
//! Abandoning a confirmation wait does not retract the submitted
//! operation: it may still land, and callers must re-query actual state
//! rather than assume non-occurrence.

use crate::{
    actor::ProcessorHandle,
    error::{Error, Result},
    metrics::Metrics,
    types::{Entry, OwnerId, StoreAddress},
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use uuid::Uuid;

/// An operation submitted through the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// One-time account creation with a previously derived bump
    Initialize {
        /// Account owner
        owner: OwnerId,
        /// Derived bump
        bump: u8,
    },

    /// Append one entry (the timestamp is assigned at commit, not here)
    RecordIncoming {
        /// Account owner
        owner: OwnerId,
        /// Item text
        item: String,
        /// Free-form price text
        price: String,
        /// Signed quantity
        quantity: i64,
    },

    /// Read the full entry sequence
    CheckStore {
        /// Account owner
        owner: OwnerId,
    },
}

/// Confirmed output of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutput {
    /// Account created at this address
    Initialized(StoreAddress),
    /// Entry as committed (with its ledger-assigned timestamp)
    Recorded(Entry),
    /// Full entry sequence in append order
    Entries(Vec<Entry>),
}

/// Commitment depth to wait for.
///
/// The in-process channel commits through a single writer, so every level
/// is reached at commit; the distinction documents the seam for channels
/// fronting a distributed log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationLevel {
    /// Operation executed
    Processed,
    /// Operation durably committed
    #[default]
    Confirmed,
    /// Commitment can no longer be rolled back
    Finalized,
}

/// Terminal signal for a submitted operation
#[derive(Debug)]
pub enum ConfirmationStatus {
    /// Committed; carries the confirmed output
    Confirmed(OperationOutput),
    /// Rejected with the processor's reason, unmodified
    Rejected(Error),
    /// Bounded wait elapsed; outcome unknown, operation not retracted
    TimedOut,
}

/// Provisional handle returned by a submission
#[derive(Debug)]
pub struct SubmissionHandle {
    submission_id: Uuid,
}

impl SubmissionHandle {
    /// Create a handle; channel implementations call this at submit time
    pub fn new(submission_id: Uuid) -> Self {
        Self { submission_id }
    }

    /// Unique, time-ordered id of this submission
    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }
}

/// Asynchronous commit-and-confirm channel
#[async_trait]
pub trait CommitChannel: Send + Sync {
    /// Hand the operation to the commit path; returns immediately
    async fn submit(&self, operation: Operation) -> Result<SubmissionHandle>;

    /// Suspend until the operation reaches `level`, is rejected, or the
    /// channel's bounded wait elapses
    async fn await_confirmation(
        &self,
        handle: &SubmissionHandle,
        level: ConfirmationLevel,
    ) -> Result<ConfirmationStatus>;
}

type PendingConfirmation = (Instant, oneshot::Receiver<Result<OperationOutput>>);

/// Channel implementation that drives the in-process actor
pub struct InProcessChannel {
    processor: ProcessorHandle,
    confirmation_timeout: Duration,
    pending: DashMap<Uuid, PendingConfirmation>,
    metrics: Metrics,
}

impl InProcessChannel {
    /// Create a channel over an actor handle with a bounded
    /// confirmation wait
    pub fn new(processor: ProcessorHandle, confirmation_timeout: Duration, metrics: Metrics) -> Self {
        Self {
            processor,
            confirmation_timeout,
            pending: DashMap::new(),
            metrics,
        }
    }
}

#[async_trait]
impl CommitChannel for InProcessChannel {
    async fn submit(&self, operation: Operation) -> Result<SubmissionHandle> {
        let submission_id = Uuid::now_v7();
        let (tx, rx) = oneshot::channel();
        let processor = self.processor.clone();

        // The commit task runs to completion even if the wait below is
        // abandoned; abandonment does not retract a broadcast operation.
        tokio::spawn(async move {
            let result = match operation {
                Operation::Initialize { owner, bump } => processor
                    .initialize(owner, bump)
                    .await
                    .map(OperationOutput::Initialized),
                Operation::RecordIncoming {
                    owner,
                    item,
                    price,
                    quantity,
                } => processor
                    .record_incoming(owner, item, price, quantity)
                    .await
                    .map(OperationOutput::Recorded),
                Operation::CheckStore { owner } => processor
                    .check_store(owner)
                    .await
                    .map(OperationOutput::Entries),
            };
            let _ = tx.send(result);
        });

        self.pending.insert(submission_id, (Instant::now(), rx));

        Ok(SubmissionHandle::new(submission_id))
    }

    async fn await_confirmation(
        &self,
        handle: &SubmissionHandle,
        _level: ConfirmationLevel,
    ) -> Result<ConfirmationStatus> {
        let (_, (submitted_at, rx)) = self
            .pending
            .remove(&handle.submission_id())
            .ok_or_else(|| {
                Error::Concurrency("unknown or already awaited submission".to_string())
            })?;

        match tokio::time::timeout(self.confirmation_timeout, rx).await {
            Ok(Ok(Ok(output))) => {
                self.metrics
                    .record_confirmation(submitted_at.elapsed().as_secs_f64());
                Ok(ConfirmationStatus::Confirmed(output))
            }
            Ok(Ok(Err(err))) => {
                self.metrics.record_rejection();
                Ok(ConfirmationStatus::Rejected(err))
            }
            Ok(Err(_)) => Err(Error::Concurrency(
                "commit task dropped its response channel".to_string(),
            )),
            Err(_) => {
                self.metrics.record_timeout();
                tracing::warn!(
                    submission_id = %handle.submission_id(),
                    "confirmation wait elapsed; operation may still commit"
                );
                Ok(ConfirmationStatus::TimedOut)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::spawn_processor_actor;
    use crate::address;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::processor::Processor;
    use crate::storage::Storage;
    use crate::types::OwnerKeypair;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_channel() -> (InProcessChannel, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let storage = Arc::new(Storage::open(&config).unwrap());
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let processor = Processor::new(storage, clock, config.account.max_account_bytes);
        let handle = spawn_processor_actor(processor, Metrics::new().unwrap(), 64);
        let channel = InProcessChannel::new(handle, Duration::from_secs(5), Metrics::new().unwrap());
        (channel, temp_dir)
    }

    #[tokio::test]
    async fn test_submit_and_confirm() {
        let (channel, _temp) = test_channel();
        let owner = OwnerKeypair::from_seed(&[21u8; 32]).owner_id();
        let (expected_address, bump) = address::derive_store_address(&owner).unwrap();

        let handle = channel
            .submit(Operation::Initialize { owner, bump })
            .await
            .unwrap();
        let status = channel
            .await_confirmation(&handle, ConfirmationLevel::Confirmed)
            .await
            .unwrap();

        match status {
            ConfirmationStatus::Confirmed(OperationOutput::Initialized(address)) => {
                assert_eq!(address, expected_address);
            }
            other => panic!("expected confirmation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejection_carries_reason() {
        let (channel, _temp) = test_channel();
        let owner = OwnerKeypair::from_seed(&[22u8; 32]).owner_id();

        let handle = channel
            .submit(Operation::CheckStore { owner })
            .await
            .unwrap();
        let status = channel
            .await_confirmation(&handle, ConfirmationLevel::Confirmed)
            .await
            .unwrap();

        match status {
            ConfirmationStatus::Rejected(err) => assert!(err.is_not_initialized()),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_awaiting_twice_is_an_error() {
        let (channel, _temp) = test_channel();
        let owner = OwnerKeypair::from_seed(&[23u8; 32]).owner_id();

        let handle = channel
            .submit(Operation::CheckStore { owner })
            .await
            .unwrap();
        channel
            .await_confirmation(&handle, ConfirmationLevel::Confirmed)
            .await
            .unwrap();

        let err = channel
            .await_confirmation(&handle, ConfirmationLevel::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Concurrency(_)));
    }

    #[tokio::test]
    async fn test_all_levels_confirm_in_process() {
        let (channel, _temp) = test_channel();
        let owner = OwnerKeypair::from_seed(&[24u8; 32]).owner_id();
        let (_, bump) = address::derive_store_address(&owner).unwrap();

        let handle = channel
            .submit(Operation::Initialize { owner, bump })
            .await
            .unwrap();
        let status = channel
            .await_confirmation(&handle, ConfirmationLevel::Finalized)
            .await
            .unwrap();
        assert!(matches!(status, ConfirmationStatus::Confirmed(_)));
    }
}

//! Confirmation-aware client
//!
//! Bridges a caller's synchronous expectations to the asynchronous
//! commit-and-confirm channel. The client never trusts its own
//! pre-submission guess of post-state: after every confirmed mutation it
//! re-runs the query and replaces its cached view with the confirmed
//! read. On a timed-out wait it re-queries actual state before surfacing
//! the ambiguity, since the operation may still land.
//!
//! Submissions against a single account are serialized through a
//! per-address mutex: append #2 is never submitted before append #1's
//! outcome is known.

use crate::{
    address,
    channel::{CommitChannel, ConfirmationLevel, ConfirmationStatus, Operation, OperationOutput},
    error::{Error, Result},
    types::{Entry, OwnerId, StoreAddress},
};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Client for one commit/confirmation channel.
///
/// Cheap to share behind an `Arc`; one instance serializes its own
/// submissions per account but does not coordinate with other instances.
pub struct StoreClient {
    channel: Arc<dyn CommitChannel>,
    level: ConfirmationLevel,
    cache: RwLock<HashMap<StoreAddress, Vec<Entry>>>,
    submit_locks: DashMap<StoreAddress, Arc<Mutex<()>>>,
}

impl StoreClient {
    /// Create a client over a channel, waiting for `level` on every
    /// submission
    pub fn new(channel: Arc<dyn CommitChannel>, level: ConfirmationLevel) -> Self {
        Self {
            channel,
            level,
            cache: RwLock::new(HashMap::new()),
            submit_locks: DashMap::new(),
        }
    }

    /// Last confirmed view of the owner's entries, if any query has
    /// completed. This is what a presentation shell renders between
    /// refreshes.
    pub fn cached_entries(&self, owner: &OwnerId) -> Result<Option<Vec<Entry>>> {
        let (address, _) = address::derive_store_address(owner)?;
        Ok(self.cache.read().get(&address).cloned())
    }

    /// Confirmed read of the owner's full entry sequence.
    ///
    /// Updates the cached view on success.
    pub async fn query(&self, owner: &OwnerId) -> Result<Vec<Entry>> {
        let (address, _) = address::derive_store_address(owner)?;

        match self
            .submit_and_confirm(Operation::CheckStore { owner: *owner })
            .await?
        {
            ConfirmationStatus::Confirmed(OperationOutput::Entries(entries)) => {
                self.cache.write().insert(address, entries.clone());
                Ok(entries)
            }
            ConfirmationStatus::Confirmed(_) => Err(Error::Concurrency(
                "query confirmed with mismatched output".to_string(),
            )),
            ConfirmationStatus::Rejected(err) => Err(err),
            ConfirmationStatus::TimedOut => Err(Error::ConfirmationTimedOut),
        }
    }

    /// Ensure the owner's account exists: probe with a query and
    /// initialize only on the missing-account signal.
    ///
    /// Losing an initialization race is treated as "nothing to do". The
    /// probe-then-init sequence runs under the account's submission lock
    /// so it cannot interleave with this client's own appends.
    pub async fn initialize_if_needed(&self, owner: &OwnerId) -> Result<()> {
        let (address, bump) = address::derive_store_address(owner)?;
        let lock = self.submit_lock(address);
        let _guard = lock.lock().await;

        match self.query(owner).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_initialized() => self.initialize_once(owner, bump).await,
            Err(err) => Err(err),
        }
    }

    /// Append one entry and return the refreshed confirmed view.
    ///
    /// On the missing-account rejection the client initializes and
    /// retries the append exactly once. All other rejections propagate
    /// unmodified. A timed-out wait re-queries actual state before
    /// surfacing [`Error::ConfirmationTimedOut`].
    pub async fn append(
        &self,
        owner: &OwnerId,
        item: impl Into<String>,
        price: impl Into<String>,
        quantity: i64,
    ) -> Result<Vec<Entry>> {
        let (address, bump) = address::derive_store_address(owner)?;
        let lock = self.submit_lock(address);
        let _guard = lock.lock().await;

        let operation = Operation::RecordIncoming {
            owner: *owner,
            item: item.into(),
            price: price.into(),
            quantity,
        };

        match self.submit_and_confirm(operation.clone()).await? {
            ConfirmationStatus::Confirmed(_) => self.query(owner).await,
            ConfirmationStatus::Rejected(err) if err.is_not_initialized() => {
                // At most one implicit init-then-retry per missing-account
                // condition.
                self.initialize_once(owner, bump).await?;
                match self.submit_and_confirm(operation).await? {
                    ConfirmationStatus::Confirmed(_) => self.query(owner).await,
                    ConfirmationStatus::Rejected(err) => Err(err),
                    ConfirmationStatus::TimedOut => self.timed_out(owner).await,
                }
            }
            ConfirmationStatus::Rejected(err) => Err(err),
            ConfirmationStatus::TimedOut => self.timed_out(owner).await,
        }
    }

    async fn initialize_once(&self, owner: &OwnerId, bump: u8) -> Result<()> {
        match self
            .submit_and_confirm(Operation::Initialize {
                owner: *owner,
                bump,
            })
            .await?
        {
            ConfirmationStatus::Confirmed(_) => {
                // Authoritative view is always a subsequent confirmed read.
                self.query(owner).await?;
                Ok(())
            }
            ConfirmationStatus::Rejected(err) if err.is_already_initialized() => {
                self.query(owner).await?;
                Ok(())
            }
            ConfirmationStatus::Rejected(err) => Err(err),
            ConfirmationStatus::TimedOut => {
                // The init may still land; only a confirmed read decides.
                match self.query(owner).await {
                    Ok(_) => Ok(()),
                    Err(_) => Err(Error::ConfirmationTimedOut),
                }
            }
        }
    }

    async fn timed_out<T>(&self, owner: &OwnerId) -> Result<T> {
        // Refresh the cache from actual state; the abandoned operation may
        // have landed after the wait expired.
        let _ = self.query(owner).await;
        Err(Error::ConfirmationTimedOut)
    }

    async fn submit_and_confirm(&self, operation: Operation) -> Result<ConfirmationStatus> {
        let handle = self.channel.submit(operation).await?;
        self.channel.await_confirmation(&handle, self.level).await
    }

    fn submit_lock(&self, address: StoreAddress) -> Arc<Mutex<()>> {
        self.submit_locks
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::spawn_processor_actor;
    use crate::channel::{InProcessChannel, SubmissionHandle};
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::metrics::Metrics;
    use crate::processor::Processor;
    use crate::storage::Storage;
    use crate::types::OwnerKeypair;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn test_client() -> (StoreClient, Arc<ManualClock>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let storage = Arc::new(Storage::open(&config).unwrap());
        let clock = Arc::new(ManualClock::new(1_700_000_000));
        let processor = Processor::new(storage, clock.clone(), config.account.max_account_bytes);
        let handle = spawn_processor_actor(processor, Metrics::new().unwrap(), 64);
        let channel = Arc::new(InProcessChannel::new(
            handle,
            Duration::from_secs(5),
            Metrics::new().unwrap(),
        ));
        let client = StoreClient::new(channel, ConfirmationLevel::Confirmed);
        (client, clock, temp_dir)
    }

    #[tokio::test]
    async fn test_initialize_if_needed_is_idempotent() {
        let (client, _clock, _temp) = test_client();
        let owner = OwnerKeypair::from_seed(&[31u8; 32]).owner_id();

        client.initialize_if_needed(&owner).await.unwrap();
        client.initialize_if_needed(&owner).await.unwrap();

        assert!(client.query(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_initializes_missing_account_once() {
        let (client, _clock, _temp) = test_client();
        let owner = OwnerKeypair::from_seed(&[32u8; 32]).owner_id();

        // No explicit initialize; append probes, initializes, retries.
        let entries = client.append(&owner, "Laptop", "2000", 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].item, "Laptop");
        assert_eq!(entries[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_sequential_appends_keep_order_and_refresh_cache() {
        let (client, clock, _temp) = test_client();
        let owner = OwnerKeypair::from_seed(&[33u8; 32]).owner_id();
        client.initialize_if_needed(&owner).await.unwrap();

        clock.set(100);
        client.append(&owner, "Laptop", "2000", 10).await.unwrap();
        clock.set(200);
        client.append(&owner, "Tablet", "1000", 5).await.unwrap();
        clock.set(300);
        let entries = client.append(&owner, "Phone", "800", 20).await.unwrap();

        let items: Vec<&str> = entries.iter().map(|e| e.item.as_str()).collect();
        assert_eq!(items, ["Laptop", "Tablet", "Phone"]);
        assert_eq!(entries[1].entry_timestamp, 200);

        // The cached view is the refreshed confirmed read.
        let cached = client.cached_entries(&owner).unwrap().unwrap();
        assert_eq!(cached, entries);
    }

    #[tokio::test]
    async fn test_query_unknown_owner_is_not_found() {
        let (client, _clock, _temp) = test_client();
        let owner = OwnerKeypair::from_seed(&[34u8; 32]).owner_id();

        let err = client.query(&owner).await.unwrap_err();
        assert!(err.is_not_initialized());
        assert!(client.cached_entries(&owner).unwrap().is_none());
    }

    /// Scripted channel: responds to submissions in order with canned
    /// statuses and logs every operation it sees.
    struct ScriptedChannel {
        script: parking_lot::Mutex<VecDeque<ConfirmationStatus>>,
        log: parking_lot::Mutex<Vec<Operation>>,
    }

    impl ScriptedChannel {
        fn new(script: Vec<ConfirmationStatus>) -> Self {
            Self {
                script: parking_lot::Mutex::new(script.into()),
                log: parking_lot::Mutex::new(Vec::new()),
            }
        }

        fn operations(&self) -> Vec<Operation> {
            self.log.lock().clone()
        }
    }

    #[async_trait]
    impl CommitChannel for ScriptedChannel {
        async fn submit(&self, operation: Operation) -> Result<SubmissionHandle> {
            self.log.lock().push(operation);
            Ok(SubmissionHandle::new(Uuid::now_v7()))
        }

        async fn await_confirmation(
            &self,
            _handle: &SubmissionHandle,
            _level: ConfirmationLevel,
        ) -> Result<ConfirmationStatus> {
            self.script
                .lock()
                .pop_front()
                .ok_or_else(|| Error::Concurrency("script exhausted".to_string()))
        }
    }

    #[tokio::test]
    async fn test_timed_out_append_requeries_before_surfacing() {
        let owner = OwnerKeypair::from_seed(&[35u8; 32]).owner_id();
        let channel = Arc::new(ScriptedChannel::new(vec![
            // append wait expires...
            ConfirmationStatus::TimedOut,
            // ...and the follow-up query shows the entry landed anyway.
            ConfirmationStatus::Confirmed(OperationOutput::Entries(vec![Entry {
                item: "Laptop".to_string(),
                price: "2000".to_string(),
                quantity: 10,
                entry_timestamp: 42,
            }])),
        ]));
        let client = StoreClient::new(channel.clone(), ConfirmationLevel::Confirmed);

        let err = client.append(&owner, "Laptop", "2000", 10).await.unwrap_err();
        assert!(matches!(err, Error::ConfirmationTimedOut));

        // The re-query ran after the timed-out append and refreshed the cache.
        let ops = channel.operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(ops[0], Operation::RecordIncoming { .. }));
        assert!(matches!(ops[1], Operation::CheckStore { .. }));
        assert_eq!(client.cached_entries(&owner).unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_propagates_verbatim_without_retry() {
        let owner = OwnerKeypair::from_seed(&[36u8; 32]).owner_id();
        let channel = Arc::new(ScriptedChannel::new(vec![ConfirmationStatus::Rejected(
            Error::AccountFull {
                needed: 1100,
                capacity: 1008,
            },
        )]));
        let client = StoreClient::new(channel.clone(), ConfirmationLevel::Confirmed);

        let err = client.append(&owner, "Laptop", "2000", 10).await.unwrap_err();
        assert!(matches!(err, Error::AccountFull { .. }));

        // No implicit retry for a non-missing-account rejection.
        assert_eq!(channel.operations().len(), 1);
    }
}

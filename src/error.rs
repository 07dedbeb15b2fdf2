//! Error types for the store ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Store ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// No disambiguation value in the searched range produced a valid
    /// address. Fatal configuration error, never retried.
    #[error("no valid derived address for owner {0}")]
    AddressDerivation(crate::types::OwnerId),

    /// Supplied bump does not match the derived one
    #[error("bump mismatch: derived {derived}, supplied {supplied}")]
    BumpMismatch {
        /// Bump produced by derivation
        derived: u8,
        /// Bump the caller supplied
        supplied: u8,
    },

    /// Account does not exist at the derived address (query before init)
    #[error("store account not initialized: {0}")]
    StoreNotInitialized(crate::types::StoreAddress),

    /// Second initialization attempt against an existing account
    #[error("store account already initialized: {0}")]
    AlreadyInitialized(crate::types::StoreAddress),

    /// Append would exceed the account's allocated capacity
    #[error("account full: encoded size {needed} exceeds capacity {capacity}")]
    AccountFull {
        /// Encoded size the append would require
        needed: usize,
        /// Configured capacity in bytes
        capacity: usize,
    },

    /// Persisted account bytes failed to decode
    #[error("account encoding error: {0}")]
    Codec(String),

    /// Storage error (RocksDB)
    #[error("storage error: {0}")]
    Storage(String),

    /// Bounded confirmation wait elapsed; the operation is not retracted
    /// and may still commit
    #[error("confirmation wait elapsed; operation may still commit")]
    ConfirmationTimedOut,

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl Error {
    /// True for the missing-account class that triggers the client's
    /// one-shot init-then-retry.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Error::StoreNotInitialized(_))
    }

    /// True for the double-init class the client treats as "nothing to do".
    pub fn is_already_initialized(&self) -> bool {
        matches!(self, Error::AlreadyInitialized(_))
    }
}

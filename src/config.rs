//! Configuration for the store ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// RocksDB configuration
    pub rocksdb: RocksDbConfig,

    /// Commit channel configuration
    pub channel: ChannelConfig,

    /// Account configuration
    pub account: AccountConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/store-ledger"),
            service_name: "store-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            rocksdb: RocksDbConfig::default(),
            channel: ChannelConfig::default(),
            account: AccountConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64, // 64 MB; accounts stay small
            max_write_buffer_number: 4,
            max_background_jobs: 2,
        }
    }
}

/// Commit channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Bounded confirmation wait (milliseconds)
    pub confirmation_timeout_ms: u64,

    /// Actor mailbox capacity (backpressure bound)
    pub mailbox_capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_ms: 5_000, // 5s; in-process commits are fast
            mailbox_capacity: 1_000,
        }
    }
}

/// Account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Allocated capacity of one account's persisted encoding, in bytes.
    /// Appends that would encode past this are rejected.
    pub max_account_bytes: usize,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            max_account_bytes: 1_008, // 8-byte tag + 1000 bytes of entry space
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("STORE_LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(timeout) = std::env::var("STORE_LEDGER_CONFIRMATION_TIMEOUT_MS") {
            config.channel.confirmation_timeout_ms = timeout
                .parse()
                .map_err(|e| crate::Error::Config(format!("bad confirmation timeout: {}", e)))?;
        }

        if let Ok(max) = std::env::var("STORE_LEDGER_MAX_ACCOUNT_BYTES") {
            config.account.max_account_bytes = max
                .parse()
                .map_err(|e| crate::Error::Config(format!("bad account capacity: {}", e)))?;
        }

        Ok(config)
    }
}

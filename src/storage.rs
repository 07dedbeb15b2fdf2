//! Storage layer using RocksDB
//!
//! One column family:
//!
//! - `accounts` - store accounts keyed by derived address
//!
//! Values are the exact persisted layout produced by `codec`. The actor
//! is the only writer, so the database runs in single-threaded
//! column-family mode.

use crate::{
    codec,
    config::Config,
    error::{Error, Result},
    types::{StoreAccount, StoreAddress},
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Options, DB};

/// Column family names
const CF_ACCOUNTS: &str = "accounts";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for the append-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        let cf_descriptors = vec![ColumnFamilyDescriptor::new(
            CF_ACCOUNTS,
            Self::cf_options_accounts(),
        )];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "opened account store");

        Ok(Self { db })
    }

    fn cf_options_accounts() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_handle(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_ACCOUNTS)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", CF_ACCOUNTS)))
    }

    /// Get account at a derived address, if one was ever initialized
    pub fn get_account(&self, address: &StoreAddress) -> Result<Option<StoreAccount>> {
        let cf = self.cf_handle()?;

        match self.db.get_cf(cf, address.as_bytes())? {
            Some(raw) => Ok(Some(codec::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// True if an account exists at the address
    pub fn contains_account(&self, address: &StoreAddress) -> Result<bool> {
        let cf = self.cf_handle()?;
        Ok(self.db.get_cf(cf, address.as_bytes())?.is_some())
    }

    /// Write account at its derived address
    pub fn put_account(&self, address: &StoreAddress, account: &StoreAccount) -> Result<()> {
        let cf = self.cf_handle()?;
        let value = codec::encode(account);

        self.db.put_cf(cf, address.as_bytes(), &value)?;

        tracing::debug!(
            address = %address,
            entries = account.entries.len(),
            "account written"
        );

        Ok(())
    }

    /// Approximate number of initialized accounts
    pub fn approximate_accounts(&self) -> Result<u64> {
        let cf = self.cf_handle()?;
        let count = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);
        Ok(count)
    }
}

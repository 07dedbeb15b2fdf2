//! Metrics collection for observability
//!
//! Prometheus metrics on an owned registry:
//!
//! - `store_accounts_initialized_total` - accounts created
//! - `store_entries_recorded_total` - entries appended
//! - `store_queries_served_total` - confirmed reads
//! - `store_rejections_total` - rejected submissions
//! - `store_confirmation_timeouts_total` - abandoned confirmation waits
//! - `store_confirmation_duration_seconds` - submit-to-confirm latency

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Accounts created
    pub accounts_initialized: IntCounter,

    /// Entries appended
    pub entries_recorded: IntCounter,

    /// Confirmed reads served
    pub queries_served: IntCounter,

    /// Rejected submissions
    pub rejections: IntCounter,

    /// Confirmation waits that elapsed
    pub timeouts: IntCounter,

    /// Submit-to-confirm latency
    pub confirmation_duration: Histogram,

    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let accounts_initialized = IntCounter::new(
            "store_accounts_initialized_total",
            "Total store accounts created",
        )?;
        registry.register(Box::new(accounts_initialized.clone()))?;

        let entries_recorded = IntCounter::new(
            "store_entries_recorded_total",
            "Total entries appended to store accounts",
        )?;
        registry.register(Box::new(entries_recorded.clone()))?;

        let queries_served = IntCounter::new(
            "store_queries_served_total",
            "Total confirmed reads served",
        )?;
        registry.register(Box::new(queries_served.clone()))?;

        let rejections = IntCounter::new(
            "store_rejections_total",
            "Total submissions rejected by the processor",
        )?;
        registry.register(Box::new(rejections.clone()))?;

        let timeouts = IntCounter::new(
            "store_confirmation_timeouts_total",
            "Total confirmation waits that elapsed",
        )?;
        registry.register(Box::new(timeouts.clone()))?;

        let confirmation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "store_confirmation_duration_seconds",
                "Submit-to-confirm latency",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 5.0]),
        )?;
        registry.register(Box::new(confirmation_duration.clone()))?;

        Ok(Self {
            accounts_initialized,
            entries_recorded,
            queries_served,
            rejections,
            timeouts,
            confirmation_duration,
            registry,
        })
    }

    /// Record account creation
    pub fn record_store_initialized(&self) {
        self.accounts_initialized.inc();
    }

    /// Record entry append
    pub fn record_entry_recorded(&self) {
        self.entries_recorded.inc();
    }

    /// Record confirmed read
    pub fn record_query_served(&self) {
        self.queries_served.inc();
    }

    /// Record rejected submission
    pub fn record_rejection(&self) {
        self.rejections.inc();
    }

    /// Record elapsed confirmation wait
    pub fn record_timeout(&self) {
        self.timeouts.inc();
    }

    /// Record submit-to-confirm latency
    pub fn record_confirmation(&self, duration_seconds: f64) {
        self.confirmation_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

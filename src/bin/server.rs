//! Store ledger daemon binary

use store_ledger::{Config, InventoryLedger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting store ledger");

    // Load configuration
    let config = Config::from_env()?;

    // Open ledger
    let ledger = InventoryLedger::open(config).await?;
    tracing::info!(accounts = ledger.account_count()?, "Ledger opened");

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down store ledger");
    ledger.shutdown().await?;
    Ok(())
}

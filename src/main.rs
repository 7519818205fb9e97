use std::sync::Arc;

use anyhow::Context;
use pocket_snapshot_indexer::{
    adapters::{HttpProvider, PostgresStore},
    application::{AppError, Indexer, PaginatingFetcher, Provider},
    infrastructure::{telemetry, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    telemetry::init();

    tracing::info!("Initializing Pocket Snapshot Indexer");

    // Dependency Injection - Store
    let store = PostgresStore::new(&config.database_url, config.db_max_connections)
        .await
        .context("connecting to the database")?;
    store.run_migrations().await?;

    // Dependency Injection - Provider
    let provider = Arc::new(HttpProvider::new(&config.rpc_url, config.rpc_timeout)?);

    let from_height = match config.from_height {
        Some(height) => height,
        None => match store.get_max_height_in_blocks().await {
            Ok(max) => max + 1,
            Err(AppError::NoPreviousHeight) => 1,
            Err(err) => return Err(err.into()),
        },
    };
    let to_height = match config.to_height {
        Some(height) => height,
        None => provider.get_height().await?,
    };

    let indexer = Indexer::with_fetcher(
        provider,
        Arc::new(store),
        PaginatingFetcher::new(config.per_page),
    );

    if from_height > to_height {
        tracing::info!(from_height, to_height, "Nothing to index");
        return Ok(());
    }

    tracing::info!(from_height, to_height, "Starting indexing run...");

    for height in from_height..=to_height {
        let report = indexer
            .index_height(height)
            .await
            .with_context(|| format!("indexing height {height}"))?;

        tracing::info!(
            height = report.height,
            hash = %report.block_hash,
            transactions = report.transactions,
            accounts = report.accounts,
            apps = report.apps,
            nodes = report.nodes,
            took_ms = report.calculated.took.num_milliseconds(),
            "Indexed height"
        );
    }

    tracing::info!(to_height, "Indexing run completed");
    Ok(())
}

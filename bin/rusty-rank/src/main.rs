//! # Rusty-Rank Binary
//!
//! Assembles the engine from configuration and compile-time storage features, then
//! runs the reference walkthrough: submit, vote, rank, group, and group ranking.

use std::sync::Arc;
#[cfg(feature = "store-redis")]
use std::time::Duration;

use anyhow::{bail, ensure, Context};
use rr_config::{AppConfig, Backend, LogConfig, StorageConfig};
use rr_core::{Item, RankBasis, RankingEngine, StorageAdapter, SystemClock, VoteOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

// Feature-gated imports: only the compiled-in backends are selectable
#[cfg(feature = "store-memory")]
use rr_store_memory::MemoryStore;

#[cfg(feature = "store-redis")]
use rr_store_redis::RedisStore;
#[cfg(feature = "store-redis")]
use secrecy::ExposeSecret;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config.log);

    // 1. Initialize Storage Implementation
    let store = build_store(&config.storage).await?;

    // 2. Assemble the engine (stateless; all state lives in the store)
    let engine = RankingEngine::new(store, Arc::new(SystemClock), config.engine)?;

    info!("🚀 Rusty-Rank walkthrough starting");
    walkthrough(&engine).await
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn StorageAdapter>> {
    match storage.backend {
        #[cfg(feature = "store-memory")]
        Backend::Memory => {
            info!("using in-memory storage");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "store-redis")]
        Backend::Redis => {
            let store = RedisStore::new(storage.redis_url.expose_secret())?
                .with_timeout(Duration::from_millis(storage.command_timeout_ms));
            store.ping().await.context("redis health check")?;
            info!("using redis storage");
            Ok(Arc::new(store))
        }
        #[allow(unreachable_patterns)]
        other => bail!("storage backend {other:?} is not compiled into this binary"),
    }
}

async fn walkthrough(engine: &RankingEngine) -> anyhow::Result<()> {
    let id = engine
        .submit("username", "A title", "http://www.google.com")
        .await?;
    info!(%id, "posted a new item");
    if let Some(item) = engine.get_item(id).await? {
        info!(record = %serde_json::to_string_pretty(&item)?, "its record looks like");
    }

    let outcome = engine.vote("other_user", id).await?;
    ensure!(outcome == VoteOutcome::Accepted, "vote was not accepted: {outcome:?}");
    let votes = engine.get_item(id).await?.map(|item| item.votes).unwrap_or_default();
    ensure!(votes > 1, "vote count did not move");
    info!(votes, "voted for the item");

    let top = engine.page_default(RankBasis::Score, 1).await?;
    ensure!(!top.is_empty(), "score ranking is empty");
    log_items("currently highest-scoring items", &top)?;

    engine.add_to_groups(id, &["new-group"]).await?;
    let grouped = engine.group_page_default("new-group", RankBasis::Score, 1).await?;
    ensure!(!grouped.is_empty(), "group ranking is empty");
    log_items("added the item to a new group, group members include", &grouped)?;

    Ok(())
}

fn log_items(heading: &str, items: &[Item]) -> anyhow::Result<()> {
    info!(count = items.len(), "{heading}");
    for item in items {
        info!(id = %item.id, item = %serde_json::to_string(item)?);
    }
    Ok(())
}

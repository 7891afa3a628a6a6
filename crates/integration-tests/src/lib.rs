//! Shared fixtures for the engine's behavioural tests.

use std::sync::Arc;

use rr_core::{EngineSettings, ItemId, ManualClock, RankingEngine};
use rr_store_memory::MemoryStore;

/// An engine over a fresh in-memory store, with storage expiry and engine time
/// both driven by the returned clock.
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryStore>,
    pub engine: RankingEngine,
}

impl Harness {
    pub fn at(now: i64) -> Self {
        Self::with_settings(now, EngineSettings::default())
    }

    pub fn with_settings(now: i64, settings: EngineSettings) -> Self {
        let clock = Arc::new(ManualClock::new(now));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        let engine = RankingEngine::new(store.clone(), clock.clone(), settings)
            .expect("default settings are valid");
        Self { clock, store, engine }
    }

    /// Submits an item at the current clock time with a title derived from `tag`.
    pub async fn submit(&self, author: &str, tag: &str) -> ItemId {
        self.engine
            .submit(author, tag, &format!("https://example.com/{tag}"))
            .await
            .expect("submit")
    }
}

/// Ids in page order.
pub fn ids(items: &[rr_core::Item]) -> Vec<ItemId> {
    items.iter().map(|item| item.id).collect()
}

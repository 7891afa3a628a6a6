//! # Group Index
//!
//! Group membership plus a short-lived cached ranking per (group, basis).
//!
//! A cache miss rebuilds the view by intersecting the group set with the global
//! ranking (MAX aggregation). Concurrent misses may each rebuild; the last write
//! wins and all writers produce the same view. Staleness is bounded by the TTL.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::keys;
use crate::models::{Aggregate, Item, ItemId, RankBasis};
use crate::settings::EngineSettings;
use crate::traits::StorageAdapter;

use super::ranking::RankingIndex;
use super::require;

#[derive(Clone)]
pub struct GroupIndex {
    store: Arc<dyn StorageAdapter>,
    ranking: RankingIndex,
    settings: EngineSettings,
}

impl GroupIndex {
    pub fn new(store: Arc<dyn StorageAdapter>, settings: EngineSettings) -> Self {
        let ranking = RankingIndex::new(store.clone());
        Self { store, ranking, settings }
    }

    /// Idempotent.
    #[instrument(skip(self))]
    pub async fn add_to_group(&self, id: ItemId, group: &str) -> Result<()> {
        require("group", group)?;
        let added = self.store.set_add(&keys::group(group), &id.member()).await?;
        debug!(%id, group, added, "group membership");
        Ok(())
    }

    /// Adds the item to each group in turn; stops at the first failure.
    pub async fn add_to_groups(&self, id: ItemId, groups: &[&str]) -> Result<()> {
        for group in groups {
            require("group", group)?;
        }
        for group in groups {
            self.add_to_group(id, group).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn group_page(
        &self,
        group: &str,
        basis: RankBasis,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Item>> {
        require("group", group)?;
        let cache_key = keys::group_ranking(group, basis);

        if self.store.key_exists(&cache_key).await? {
            debug!(%cache_key, "group ranking cache hit");
        } else {
            let sources = [keys::group(group), basis.ranking_key().to_string()];
            let size = self
                .store
                .intersect_ordered_maps(&cache_key, &sources, Aggregate::Max)
                .await?;
            self.store
                .expire(&cache_key, self.settings.group_cache_ttl())
                .await?;
            info!(%cache_key, size, ttl = self.settings.group_cache_ttl_secs, "group ranking rebuilt");
        }

        self.ranking.page_of(&cache_key, page, page_size).await
    }
}

//! # Ranking Engine
//!
//! The four components (repository, ledger, ranking, groups) and the
//! [`RankingEngine`] facade that an embedding service talks to.

mod groups;
mod ledger;
mod ranking;
mod repository;

pub use groups::GroupIndex;
pub use ledger::VoteLedger;
pub use ranking::RankingIndex;
pub use repository::ItemRepository;

use std::sync::Arc;

use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Item, ItemId, RankBasis, VoteOutcome};
use crate::settings::EngineSettings;
use crate::traits::{Clock, StorageAdapter};

/// Rejects empty or whitespace-only input before any storage round trip.
pub(crate) fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Stateless facade over a storage adapter. Cheap to clone and share across tasks.
#[derive(Clone)]
pub struct RankingEngine {
    items: ItemRepository,
    ledger: VoteLedger,
    ranking: RankingIndex,
    groups: GroupIndex,
    settings: EngineSettings,
}

impl RankingEngine {
    pub fn new(
        store: Arc<dyn StorageAdapter>,
        clock: Arc<dyn Clock>,
        settings: EngineSettings,
    ) -> Result<Self> {
        settings.validate()?;
        info!(?settings, "ranking engine configured");

        Ok(Self {
            items: ItemRepository::new(store.clone(), clock.clone(), settings.clone()),
            ledger: VoteLedger::new(store.clone(), clock, settings.clone()),
            ranking: RankingIndex::new(store.clone()),
            groups: GroupIndex::new(store, settings.clone()),
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn submit(&self, author: &str, title: &str, link: &str) -> Result<ItemId> {
        self.items.submit(author, title, link).await
    }

    pub async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        self.items.get(id).await
    }

    pub async fn vote(&self, user: &str, id: ItemId) -> Result<VoteOutcome> {
        self.ledger.vote(user, id).await
    }

    pub async fn has_voted(&self, user: &str, id: ItemId) -> Result<bool> {
        self.ledger.has_voted(user, id).await
    }

    pub async fn page(&self, basis: RankBasis, page: usize, page_size: usize) -> Result<Vec<Item>> {
        self.ranking.page(basis, page, page_size).await
    }

    /// [`page`](Self::page) with the configured page size.
    pub async fn page_default(&self, basis: RankBasis, page: usize) -> Result<Vec<Item>> {
        self.page(basis, page, self.settings.page_size).await
    }

    pub async fn add_to_group(&self, id: ItemId, group: &str) -> Result<()> {
        self.groups.add_to_group(id, group).await
    }

    pub async fn add_to_groups(&self, id: ItemId, groups: &[&str]) -> Result<()> {
        self.groups.add_to_groups(id, groups).await
    }

    pub async fn group_page(
        &self,
        group: &str,
        basis: RankBasis,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Item>> {
        self.groups.group_page(group, basis, page, page_size).await
    }

    /// [`group_page`](Self::group_page) with the configured page size.
    pub async fn group_page_default(&self, group: &str, basis: RankBasis, page: usize) -> Result<Vec<Item>> {
        self.group_page(group, basis, page, self.settings.page_size).await
    }
}

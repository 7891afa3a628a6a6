//! # Item Repository
//!
//! Creates items and reads their attribute records.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::keys;
use crate::models::{Item, ItemId};
use crate::settings::EngineSettings;
use crate::traits::{Clock, StorageAdapter};

use super::require;

#[derive(Clone)]
pub struct ItemRepository {
    store: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
}

impl ItemRepository {
    pub fn new(store: Arc<dyn StorageAdapter>, clock: Arc<dyn Clock>, settings: EngineSettings) -> Self {
        Self { store, clock, settings }
    }

    /// Submits a new item and returns its id.
    ///
    /// The author is recorded in the vote record so a later self-vote is a duplicate.
    /// The record outlives the voting window measured from the creation time.
    /// Steps are individually atomic; a storage failure midway is surfaced as-is.
    #[instrument(skip(self, title, link))]
    pub async fn submit(&self, author: &str, title: &str, link: &str) -> Result<ItemId> {
        require("author", author)?;
        require("title", title)?;
        require("link", link)?;

        let now = self.clock.now();
        let id = ItemId(self.store.next_id(keys::ITEM_COUNTER).await?);

        let voted = keys::voted(id);
        self.store.set_add(&voted, author).await?;
        self.store.expire(&voted, self.settings.vote_record_ttl()).await?;

        let item = Item {
            id,
            title: title.to_string(),
            link: link.to_string(),
            author: author.to_string(),
            created_at: now,
            votes: 1,
        };
        let member = id.member();
        self.store.hash_write(&member, &item.to_fields()).await?;

        let score = now as f64 + self.settings.base_weight;
        self.store.ordered_map_insert(keys::SCORE_RANKING, &member, score).await?;
        self.store.ordered_map_insert(keys::TIME_RANKING, &member, now as f64).await?;

        info!(%id, created_at = now, score, "item submitted");
        Ok(id)
    }

    /// Reads one item's attribute record; `None` if it does not exist.
    pub async fn get(&self, id: ItemId) -> Result<Option<Item>> {
        let record = self.store.hash_read(&id.member()).await?;
        let item = Item::from_fields(id, &record)?;
        debug!(%id, found = item.is_some(), "item lookup");
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AppError;
    use crate::models::fields;
    use crate::traits::MockStorageAdapter;
    use mockall::Sequence;
    use std::collections::HashMap;
    use std::time::Duration;

    fn repo(store: MockStorageAdapter) -> ItemRepository {
        ItemRepository::new(Arc::new(store), Arc::new(ManualClock::new(1000)), EngineSettings::default())
    }

    #[tokio::test]
    async fn submit_writes_record_rankings_and_vote_gate() {
        let mut store = MockStorageAdapter::new();
        let mut seq = Sequence::new();

        store
            .expect_next_id()
            .withf(|counter| counter == "item:")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(1));
        store
            .expect_set_add()
            .withf(|key, member| key == "voted:1" && member == "alice")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(true));
        store
            .expect_expire()
            .withf(|key, ttl| key == "voted:1" && *ttl == Duration::from_secs(604_800 + 86_400))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(true));
        store
            .expect_hash_write()
            .withf(|key, record: &HashMap<String, String>| {
                key == "item:1"
                    && record.get(fields::VOTES).map(String::as_str) == Some("1")
                    && record.get(fields::CREATED_AT).map(String::as_str) == Some("1000")
                    && record.get(fields::AUTHOR).map(String::as_str) == Some("alice")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        store
            .expect_ordered_map_insert()
            .withf(|key, member, score| key == "score:" && member == "item:1" && *score == 1432.0)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_ordered_map_insert()
            .withf(|key, member, score| key == "time:" && member == "item:1" && *score == 1000.0)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));

        let id = repo(store).submit("alice", "A title", "http://www.google.com").await.unwrap();
        assert_eq!(id, ItemId(1));
    }

    #[tokio::test]
    async fn empty_title_is_rejected_before_storage() {
        // No expectations: any storage call would panic.
        let store = MockStorageAdapter::new();
        let err = repo(store).submit("alice", "  ", "http://x").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn storage_failure_propagates_unmodified() {
        let mut store = MockStorageAdapter::new();
        store
            .expect_next_id()
            .returning(|_| Err(AppError::unavailable("connection refused")));

        let err = repo(store).submit("alice", "t", "l").await.unwrap_err();
        assert_eq!(err, AppError::unavailable("connection refused"));
    }

    #[tokio::test]
    async fn get_of_unknown_item_is_none() {
        let mut store = MockStorageAdapter::new();
        store.expect_hash_read().returning(|_| Ok(HashMap::new()));
        assert_eq!(repo(store).get(ItemId(99)).await.unwrap(), None);
    }
}

//! # Vote Ledger
//!
//! One vote per user per item, accepted only inside the voting window.
//!
//! Freshness is decided by the time ranking alone, never by the expiry of the
//! vote record. The record lives past the window, so it still exists at the
//! last second votes are accepted.
//! The atomic `set_add` on the vote record is the only gate for the score and
//! vote-count increments.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::keys;
use crate::models::{fields, ItemId, VoteOutcome};
use crate::settings::EngineSettings;
use crate::traits::{Clock, StorageAdapter};

use super::require;

#[derive(Clone)]
pub struct VoteLedger {
    store: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    settings: EngineSettings,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn StorageAdapter>, clock: Arc<dyn Clock>, settings: EngineSettings) -> Self {
        Self { store, clock, settings }
    }

    #[instrument(skip(self))]
    pub async fn vote(&self, user: &str, id: ItemId) -> Result<VoteOutcome> {
        require("user", user)?;

        let member = id.member();
        let cutoff = self.clock.now().saturating_sub(self.settings.voting_window_offset());
        let created_at = self.store.ordered_map_score(keys::TIME_RANKING, &member).await?;

        match created_at {
            Some(created_at) if created_at >= cutoff as f64 => {}
            _ => {
                debug!(%id, ?created_at, cutoff, "vote outside window");
                return Ok(VoteOutcome::RejectedExpired);
            }
        }

        if !self.store.set_add(&keys::voted(id), user).await? {
            debug!(%id, "duplicate vote");
            return Ok(VoteOutcome::RejectedDuplicate);
        }

        let score = self
            .store
            .ordered_map_increment(keys::SCORE_RANKING, &member, self.settings.vote_weight)
            .await?;
        let votes = self.store.hash_increment(&member, fields::VOTES, 1).await?;

        debug!(%id, score, votes, "vote accepted");
        Ok(VoteOutcome::Accepted)
    }

    /// Whether `user` is in the item's vote record. Diagnostic only: an expired
    /// record reads as "not voted" even though voting is closed.
    pub async fn has_voted(&self, user: &str, id: ItemId) -> Result<bool> {
        require("user", user)?;
        self.store.set_contains(&keys::voted(id), user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AppError;
    use crate::settings::ONE_WEEK_IN_SECONDS;
    use crate::traits::MockStorageAdapter;
    use mockall::Sequence;

    const NOW: i64 = 2_000_000;

    fn ledger(store: MockStorageAdapter) -> VoteLedger {
        VoteLedger::new(Arc::new(store), Arc::new(ManualClock::new(NOW)), EngineSettings::default())
    }

    #[tokio::test]
    async fn accepted_vote_increments_after_gate() {
        let mut store = MockStorageAdapter::new();
        let mut seq = Sequence::new();

        store
            .expect_ordered_map_score()
            .withf(|key, member| key == "time:" && member == "item:5")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Some((NOW - 10) as f64)));
        store
            .expect_set_add()
            .withf(|key, member| key == "voted:5" && member == "bob")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(true));
        store
            .expect_ordered_map_increment()
            .withf(|key, member, delta| key == "score:" && member == "item:5" && *delta == 432.0)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(5000.0));
        store
            .expect_hash_increment()
            .withf(|key, field, delta| key == "item:5" && field == "votes" && *delta == 1)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(2));

        assert_eq!(ledger(store).vote("bob", ItemId(5)).await.unwrap(), VoteOutcome::Accepted);
    }

    #[tokio::test]
    async fn duplicate_vote_never_increments() {
        let mut store = MockStorageAdapter::new();
        store
            .expect_ordered_map_score()
            .returning(|_, _| Ok(Some(NOW as f64)));
        store.expect_set_add().times(1).returning(|_, _| Ok(false));
        store.expect_ordered_map_increment().never();
        store.expect_hash_increment().never();

        assert_eq!(
            ledger(store).vote("bob", ItemId(5)).await.unwrap(),
            VoteOutcome::RejectedDuplicate
        );
    }

    #[tokio::test]
    async fn stale_item_is_rejected_without_touching_vote_record() {
        let mut store = MockStorageAdapter::new();
        let created = NOW - ONE_WEEK_IN_SECONDS as i64 - 1;
        store
            .expect_ordered_map_score()
            .returning(move |_, _| Ok(Some(created as f64)));
        store.expect_set_add().never();

        assert_eq!(
            ledger(store).vote("bob", ItemId(5)).await.unwrap(),
            VoteOutcome::RejectedExpired
        );
    }

    #[tokio::test]
    async fn item_exactly_at_cutoff_still_goes_through_the_gate() {
        let mut store = MockStorageAdapter::new();
        let created = NOW - ONE_WEEK_IN_SECONDS as i64;
        store
            .expect_ordered_map_score()
            .returning(move |_, _| Ok(Some(created as f64)));
        // The gate decides: a prior voter is still a duplicate on the last second.
        store
            .expect_set_add()
            .withf(|key, member| key == "voted:5" && member == "bob")
            .times(1)
            .returning(|_, _| Ok(false));
        store.expect_ordered_map_increment().never();
        store.expect_hash_increment().never();

        assert_eq!(
            ledger(store).vote("bob", ItemId(5)).await.unwrap(),
            VoteOutcome::RejectedDuplicate
        );
    }

    #[tokio::test]
    async fn unknown_item_is_expired() {
        let mut store = MockStorageAdapter::new();
        store.expect_ordered_map_score().returning(|_, _| Ok(None));
        store.expect_set_add().never();

        assert_eq!(
            ledger(store).vote("bob", ItemId(404)).await.unwrap(),
            VoteOutcome::RejectedExpired
        );
    }

    #[tokio::test]
    async fn empty_user_is_a_validation_error() {
        let store = MockStorageAdapter::new();
        let err = ledger(store).vote("", ItemId(1)).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn failure_after_gate_is_surfaced() {
        let mut store = MockStorageAdapter::new();
        store
            .expect_ordered_map_score()
            .returning(|_, _| Ok(Some(NOW as f64)));
        store.expect_set_add().returning(|_, _| Ok(true));
        store
            .expect_ordered_map_increment()
            .returning(|_, _, _| Err(AppError::unavailable("timeout")));
        store.expect_hash_increment().never();

        let err = ledger(store).vote("bob", ItemId(5)).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }
}

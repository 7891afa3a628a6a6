//! # Ranking Index
//!
//! Global pagination over the score and time rankings.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::{AppError, Result};
use crate::models::{Item, ItemId, RankBasis};
use crate::traits::StorageAdapter;

#[derive(Clone)]
pub struct RankingIndex {
    store: Arc<dyn StorageAdapter>,
}

impl RankingIndex {
    pub fn new(store: Arc<dyn StorageAdapter>) -> Self {
        Self { store }
    }

    /// One page of items, highest ranked first. Page numbers start at 1;
    /// anything lower is treated as 1.
    #[instrument(skip(self))]
    pub async fn page(&self, basis: RankBasis, page: usize, page_size: usize) -> Result<Vec<Item>> {
        self.page_of(basis.ranking_key(), page, page_size).await
    }

    /// Pages over any ordered map whose members are item ids.
    pub(crate) async fn page_of(&self, key: &str, page: usize, page_size: usize) -> Result<Vec<Item>> {
        if page_size == 0 {
            return Err(AppError::validation("page size must be greater than zero"));
        }
        let (start, end) = page_bounds(page, page_size);

        let members = self.store.ordered_map_range_desc(key, start, end).await?;
        let mut items = Vec::with_capacity(members.len());
        for member in members {
            let id = ItemId::from_member(&member)?;
            let record = self.store.hash_read(&member).await?;
            match Item::from_fields(id, &record)? {
                Some(item) => items.push(item),
                // Removed by an external expiry policy while still ranked.
                None => warn!(%id, key, "ranked item has no record, skipping"),
            }
        }

        debug!(key, start, end, returned = items.len(), "page read");
        Ok(items)
    }
}

/// Zero-based half-open rank range of a one-based page.
fn page_bounds(page: usize, page_size: usize) -> (usize, usize) {
    let start = page.max(1).saturating_sub(1).saturating_mul(page_size);
    (start, start.saturating_add(page_size))
}

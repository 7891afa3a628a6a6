//! # Core Traits (Ports)
//!
//! Any storage plugin must implement these traits to be used by the engine.
//! The engine itself holds no mutable state; everything shared crosses this boundary.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Aggregate;

/// Atomic primitives of a key-value storage engine.
///
/// Every operation is atomic on its own key. Failures to reach the engine surface
/// as [`AppError::StorageUnavailable`](crate::AppError::StorageUnavailable).
/// Expired keys behave exactly like absent keys.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    // Counters
    /// Atomically increments `counter` and returns the new value (first call returns 1).
    async fn next_id(&self, counter: &str) -> Result<u64>;

    // Sets
    /// Adds `member`; true iff it was not already present. This is the vote gate.
    async fn set_add(&self, key: &str, member: &str) -> Result<bool>;
    async fn set_contains(&self, key: &str, member: &str) -> Result<bool>;

    // Hashes
    async fn hash_write(&self, key: &str, fields: &HashMap<String, String>) -> Result<()>;
    /// Empty map when the key is absent.
    async fn hash_read(&self, key: &str) -> Result<HashMap<String, String>>;
    /// Returns the field's new value.
    async fn hash_increment(&self, key: &str, field: &str, delta: i64) -> Result<i64>;

    // Ordered maps
    async fn ordered_map_insert(&self, key: &str, member: &str, score: f64) -> Result<()>;
    /// Returns the member's new score.
    async fn ordered_map_increment(&self, key: &str, member: &str, delta: f64) -> Result<f64>;
    async fn ordered_map_score(&self, key: &str, member: &str) -> Result<Option<f64>>;
    /// Members ranked `start..end` (zero-based, half-open) by descending score.
    /// Ties are ordered by member descending.
    async fn ordered_map_range_desc(&self, key: &str, start: usize, end: usize) -> Result<Vec<String>>;
    /// Stores into `dest` the members common to all `sources` (sets count as score 1),
    /// combining scores with `aggregate`. Replaces `dest`; an empty result leaves no key.
    /// Returns the size of the result.
    async fn intersect_ordered_maps(
        &self,
        dest: &str,
        sources: &[String],
        aggregate: Aggregate,
    ) -> Result<usize>;

    // Keys
    async fn key_exists(&self, key: &str) -> Result<bool>;
    /// Sets a time-to-live on an existing key. False if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;
}

/// Source of the current time, in whole seconds since the epoch.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

//! # rr-store-memory
//!
//! In-process implementation of `StorageAdapter`.
//! Features: per-key atomicity via sharded locks, lazy key expiry, MAX/MIN/SUM intersections.
//!
//! Each operation takes the shard lock of the key it touches, so every primitive is
//! atomic on its own key. Expiry is checked on access against the injected clock;
//! expired keys read as absent and are replaced on the next write.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rr_core::error::{AppError, Result};
use rr_core::models::Aggregate;
use rr_core::traits::{Clock, StorageAdapter};
use rr_core::SystemClock;
use tracing::trace;

#[derive(Debug, Clone)]
enum Value {
    Counter(i64),
    Set(HashSet<String>),
    Hash(HashMap<String, String>),
    Sorted(HashMap<String, f64>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Counter(_) => "counter",
            Value::Set(_) => "set",
            Value::Hash(_) => "hash",
            Value::Sorted(_) => "ordered map",
        }
    }
}

#[derive(Debug)]
struct Slot {
    value: Value,
    /// Seconds since epoch at which the key stops existing
    expires_at: Option<i64>,
}

impl Slot {
    fn new(value: Value) -> Self {
        Self { value, expires_at: None }
    }

    fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> AppError {
    AppError::internal(format!("key {key:?} holds a {}, not a {expected}", found.kind()))
}

pub struct MemoryStore {
    entries: DashMap<String, Slot>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Expiry follows `clock`, which lets tests step past TTLs.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { entries: DashMap::new(), clock }
    }

    /// Number of keys, including expired keys not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired key and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        trace!(purged, "expired keys purged");
        purged
    }

    /// Runs `f` against a live key; `None` if the key is absent or expired.
    fn read<R>(&self, key: &str, f: impl FnOnce(&Value) -> Result<R>) -> Result<Option<R>> {
        let now = self.clock.now();
        match self.entries.get(key) {
            None => return Ok(None),
            Some(slot) if !slot.is_expired(now) => return f(&slot.value).map(Some),
            Some(_) => {}
        }
        // The shard guard is released above; safe to take the write lock here.
        self.entries.remove_if(key, |_, slot| slot.is_expired(now));
        trace!(key, "expired key removed on read");
        Ok(None)
    }

    /// Runs `f` under the key's write lock, creating it with `init` when absent or expired.
    fn write<R>(
        &self,
        key: &str,
        init: impl Fn() -> Value,
        f: impl FnOnce(&mut Value) -> Result<R>,
    ) -> Result<R> {
        let now = self.clock.now();
        let mut slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(init()));
        if slot.is_expired(now) {
            *slot = Slot::new(init());
        }
        f(&mut slot.value)
    }

    /// Snapshot of a key as member scores, for intersections. Sets score 1 per member.
    fn scores_of(&self, key: &str) -> Result<HashMap<String, f64>> {
        let scores = self.read(key, |value| match value {
            Value::Sorted(map) => Ok(map.clone()),
            Value::Set(set) => Ok(set.iter().map(|m| (m.clone(), 1.0)).collect()),
            other => Err(wrong_type(key, "set or ordered map", other)),
        })?;
        Ok(scores.unwrap_or_default())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStore {
    async fn next_id(&self, counter: &str) -> Result<u64> {
        self.write(counter, || Value::Counter(0), |value| match value {
            Value::Counter(n) => {
                *n += 1;
                Ok(*n as u64)
            }
            other => Err(wrong_type(counter, "counter", other)),
        })
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool> {
        self.write(key, || Value::Set(HashSet::new()), |value| match value {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            other => Err(wrong_type(key, "set", other)),
        })
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool> {
        let found = self.read(key, |value| match value {
            Value::Set(set) => Ok(set.contains(member)),
            other => Err(wrong_type(key, "set", other)),
        })?;
        Ok(found.unwrap_or(false))
    }

    async fn hash_write(&self, key: &str, fields: &HashMap<String, String>) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        self.write(key, || Value::Hash(HashMap::new()), |value| match value {
            Value::Hash(hash) => {
                hash.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                Ok(())
            }
            other => Err(wrong_type(key, "hash", other)),
        })
    }

    async fn hash_read(&self, key: &str) -> Result<HashMap<String, String>> {
        let record = self.read(key, |value| match value {
            Value::Hash(hash) => Ok(hash.clone()),
            other => Err(wrong_type(key, "hash", other)),
        })?;
        Ok(record.unwrap_or_default())
    }

    async fn hash_increment(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        self.write(key, || Value::Hash(HashMap::new()), |value| match value {
            Value::Hash(hash) => {
                let current = match hash.get(field) {
                    Some(text) => text.parse::<i64>().map_err(|_| {
                        AppError::internal(format!("field {field:?} of {key:?} is not an integer"))
                    })?,
                    None => 0,
                };
                let next = current + delta;
                hash.insert(field.to_string(), next.to_string());
                Ok(next)
            }
            other => Err(wrong_type(key, "hash", other)),
        })
    }

    async fn ordered_map_insert(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.write(key, || Value::Sorted(HashMap::new()), |value| match value {
            Value::Sorted(map) => {
                map.insert(member.to_string(), score);
                Ok(())
            }
            other => Err(wrong_type(key, "ordered map", other)),
        })
    }

    async fn ordered_map_increment(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        self.write(key, || Value::Sorted(HashMap::new()), |value| match value {
            Value::Sorted(map) => {
                let score = map.entry(member.to_string()).or_insert(0.0);
                *score += delta;
                Ok(*score)
            }
            other => Err(wrong_type(key, "ordered map", other)),
        })
    }

    async fn ordered_map_score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        let score = self.read(key, |value| match value {
            Value::Sorted(map) => Ok(map.get(member).copied()),
            other => Err(wrong_type(key, "ordered map", other)),
        })?;
        Ok(score.flatten())
    }

    async fn ordered_map_range_desc(&self, key: &str, start: usize, end: usize) -> Result<Vec<String>> {
        let members = self.read(key, |value| match value {
            Value::Sorted(map) => {
                let mut ranked: Vec<(&String, f64)> = map.iter().map(|(m, s)| (m, *s)).collect();
                ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| b.0.cmp(a.0)));
                Ok(ranked
                    .into_iter()
                    .skip(start)
                    .take(end.saturating_sub(start))
                    .map(|(m, _)| m.clone())
                    .collect())
            }
            other => Err(wrong_type(key, "ordered map", other)),
        })?;
        Ok(members.unwrap_or_default())
    }

    async fn intersect_ordered_maps(
        &self,
        dest: &str,
        sources: &[String],
        aggregate: Aggregate,
    ) -> Result<usize> {
        let mut snapshots = Vec::with_capacity(sources.len());
        for source in sources {
            snapshots.push(self.scores_of(source)?);
        }

        let mut result = HashMap::new();
        if let Some((first, rest)) = snapshots.split_first() {
            for (member, score) in first {
                let combined = rest.iter().try_fold(*score, |acc, other| {
                    other.get(member).map(|s| aggregate.combine(acc, *s))
                });
                if let Some(combined) = combined {
                    result.insert(member.clone(), combined);
                }
            }
        }

        let size = result.len();
        if size == 0 {
            self.entries.remove(dest);
        } else {
            self.entries.insert(dest.to_string(), Slot::new(Value::Sorted(result)));
        }
        trace!(dest, size, "intersection stored");
        Ok(size)
    }

    async fn key_exists(&self, key: &str) -> Result<bool> {
        Ok(self.read(key, |_| Ok(()))?.is_some())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = self.clock.now();
        match self.entries.get_mut(key) {
            Some(mut slot) if !slot.is_expired(now) => {
                let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                slot.expires_at = Some(now.saturating_add(ttl));
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

//! # rr-store-redis
//!
//! Redis implementation of `StorageAdapter`, over a `deadpool-redis` connection pool.
//!
//! Each trait method is a single Redis command, so per-key atomicity comes from the
//! server. Vote de-duplication relies on `SADD` reporting whether the member was new.
//! Every command runs under a timeout; pool errors, connection errors, and timeouts
//! all surface as `StorageUnavailable`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::{self, Cmd, FromRedisValue, RedisError};
use deadpool_redis::{Config, Pool, Runtime};
use rr_core::error::{AppError, Result};
use rr_core::models::Aggregate;
use rr_core::traits::StorageAdapter;
use tracing::{debug, instrument};

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

pub struct RedisStore {
    pool: Pool,
    timeout: Duration,
}

fn map_redis_error(err: RedisError) -> AppError {
    if err.code() == Some("WRONGTYPE") {
        AppError::internal(err.to_string())
    } else {
        AppError::unavailable(err.to_string())
    }
}

impl RedisStore {
    /// Builds the pool. No connection is made until the first command.
    pub fn new(url: &str) -> Result<Self> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| AppError::unavailable(format!("redis pool: {e}")))?;
        Ok(Self { pool, timeout: DEFAULT_COMMAND_TIMEOUT })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Round trip used as a startup health check.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<()> {
        let reply: String = self.query(&redis::cmd("PING")).await?;
        debug!(reply, "redis reachable");
        Ok(())
    }

    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> Result<T> {
        let round_trip = async {
            let mut conn = self
                .pool
                .get()
                .await
                .map_err(|e| AppError::unavailable(format!("redis pool: {e}")))?;
            cmd.query_async::<T>(&mut conn).await.map_err(map_redis_error)
        };
        tokio::time::timeout(self.timeout, round_trip)
            .await
            .map_err(|_| AppError::unavailable(format!("redis command timed out after {:?}", self.timeout)))?
    }
}

#[async_trait]
impl StorageAdapter for RedisStore {
    async fn next_id(&self, counter: &str) -> Result<u64> {
        self.query(redis::cmd("INCR").arg(counter)).await
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool> {
        let added: i64 = self.query(redis::cmd("SADD").arg(key).arg(member)).await?;
        Ok(added == 1)
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool> {
        self.query(redis::cmd("SISMEMBER").arg(key).arg(member)).await
    }

    async fn hash_write(&self, key: &str, fields: &HashMap<String, String>) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        let _: i64 = self.query(&cmd).await?;
        Ok(())
    }

    async fn hash_read(&self, key: &str) -> Result<HashMap<String, String>> {
        self.query(redis::cmd("HGETALL").arg(key)).await
    }

    async fn hash_increment(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        self.query(redis::cmd("HINCRBY").arg(key).arg(field).arg(delta)).await
    }

    async fn ordered_map_insert(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let _: i64 = self.query(redis::cmd("ZADD").arg(key).arg(score).arg(member)).await?;
        Ok(())
    }

    async fn ordered_map_increment(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        self.query(redis::cmd("ZINCRBY").arg(key).arg(delta).arg(member)).await
    }

    async fn ordered_map_score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.query(redis::cmd("ZSCORE").arg(key).arg(member)).await
    }

    async fn ordered_map_range_desc(&self, key: &str, start: usize, end: usize) -> Result<Vec<String>> {
        if end <= start {
            return Ok(Vec::new());
        }
        // ZREVRANGE bounds are inclusive.
        self.query(redis::cmd("ZREVRANGE").arg(key).arg(start).arg(end - 1)).await
    }

    async fn intersect_ordered_maps(
        &self,
        dest: &str,
        sources: &[String],
        aggregate: Aggregate,
    ) -> Result<usize> {
        let mut cmd = redis::cmd("ZINTERSTORE");
        cmd.arg(dest).arg(sources.len()).arg(sources);
        cmd.arg("AGGREGATE").arg(aggregate.as_str());
        self.query(&cmd).await
    }

    async fn key_exists(&self, key: &str) -> Result<bool> {
        self.query(redis::cmd("EXISTS").arg(key)).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.query(redis::cmd("EXPIRE").arg(key).arg(ttl.as_secs())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_url_is_rejected() {
        assert!(RedisStore::new("not a url").is_err());
    }

    #[tokio::test]
    async fn empty_range_skips_round_trip() {
        // Port 1 is never a Redis server; the call must not reach the network.
        let store = RedisStore::new("redis://127.0.0.1:1/").unwrap();
        assert!(store.ordered_map_range_desc("score:", 5, 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_is_storage_unavailable() {
        let store = RedisStore::new("redis://127.0.0.1:1/")
            .unwrap()
            .with_timeout(Duration::from_millis(500));
        let err = store.key_exists("anything").await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }

    fn live_store() -> RedisStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".into());
        RedisStore::new(&url).unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running Redis at REDIS_URL"]
    async fn primitives_against_live_server() {
        let store = live_store();
        store.ping().await.unwrap();

        let prefix = format!("rr-test:{}:", std::process::id());
        let set = format!("{prefix}voted");
        let zset = format!("{prefix}score");
        let group = format!("{prefix}group");
        let cache = format!("{prefix}cache");

        assert!(store.set_add(&set, "alice").await.unwrap());
        assert!(!store.set_add(&set, "alice").await.unwrap());
        assert!(store.expire(&set, Duration::from_secs(30)).await.unwrap());

        store.ordered_map_insert(&zset, "item:1", 10.0).await.unwrap();
        store.ordered_map_insert(&zset, "item:2", 20.0).await.unwrap();
        assert_eq!(store.ordered_map_increment(&zset, "item:1", 432.0).await.unwrap(), 442.0);
        assert_eq!(
            store.ordered_map_range_desc(&zset, 0, 2).await.unwrap(),
            vec!["item:1".to_string(), "item:2".to_string()]
        );

        store.set_add(&group, "item:2").await.unwrap();
        let size = store
            .intersect_ordered_maps(&cache, &[group.clone(), zset.clone()], Aggregate::Max)
            .await
            .unwrap();
        assert_eq!(size, 1);
        assert_eq!(store.ordered_map_score(&cache, "item:2").await.unwrap(), Some(20.0));

        for key in [&set, &zset, &group, &cache] {
            let _: i64 = store.query(redis::cmd("DEL").arg(key)).await.unwrap();
        }
    }
}

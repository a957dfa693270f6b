//! [`Store`] implementation backed by a pooled Redis connection.

use super::{BlockFor, Op, Store};
use crate::error::{QueueError, QueueResult};
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use std::collections::HashMap;
use tracing::info;

/// Redis-backed store.
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Build a connection pool from a `StoreConfig` and wrap it.
    pub async fn connect(config: &crate::config::StoreConfig) -> QueueResult<Self> {
        info!(url = %config.url, "connecting to redis");

        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map_err(|e| QueueError::Pool(deadpool_redis::PoolError::Backend(
                redis::RedisError::from((redis::ErrorKind::InvalidClientConfig, "bad pool config", e.to_string())),
            )))?
            .max_size(config.pool_size)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| QueueError::Pool(deadpool_redis::PoolError::Backend(
                redis::RedisError::from((redis::ErrorKind::InvalidClientConfig, "pool build failed", e.to_string())),
            )))?;

        let mut conn = pool.get().await?;
        redis::cmd("PING").query_async::<String>(&mut *conn).await?;

        Ok(Self { pool })
    }

    /// Wrap an already-built pool (e.g. shared across components).
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> QueueResult<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn hset(&self, key: &str, fields: &[(&str, &[u8])]) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> QueueResult<Option<Vec<u8>>> {
        let mut conn = self.conn().await?;
        Ok(conn.hget(key, field).await?)
    }

    async fn hgetall(&self, key: &str) -> QueueResult<HashMap<String, Vec<u8>>> {
        let mut conn = self.conn().await?;
        Ok(conn.hgetall(key).await?)
    }

    async fn hdel(&self, key: &str, field: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.hdel(key, field).await?;
        Ok(())
    }

    async fn rpush(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.rpush(key, value).await?;
        Ok(())
    }

    async fn lpush(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.lpush(key, value).await?;
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<Vec<u8>>> {
        let mut conn = self.conn().await?;
        Ok(conn.lrange(key, start, stop).await?)
    }

    async fn lrem(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.lrem(key, 0, value).await?;
        Ok(())
    }

    async fn llen(&self, key: &str) -> QueueResult<usize> {
        let mut conn = self.conn().await?;
        Ok(conn.llen(key).await?)
    }

    async fn blpop(&self, keys: &[String], block: BlockFor) -> QueueResult<Option<(String, Vec<u8>)>> {
        let timeout = match block {
            BlockFor::Forever => 0.0,
            BlockFor::Seconds(s) => s as f64,
            BlockFor::NonBlocking => {
                let mut conn = self.conn().await?;
                for key in keys {
                    let popped: Option<Vec<u8>> = conn.lpop(key, None).await?;
                    if let Some(value) = popped {
                        return Ok(Some((key.clone(), value)));
                    }
                }
                return Ok(None);
            }
        };
        let mut conn = self.conn().await?;
        let result: Option<(String, Vec<u8>)> = conn.blpop(keys.to_vec(), timeout).await?;
        Ok(result)
    }

    async fn sadd(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.sadd(key, value).await?;
        Ok(())
    }

    async fn srem(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.srem(key, value).await?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> QueueResult<Vec<Vec<u8>>> {
        let mut conn = self.conn().await?;
        Ok(conn.smembers(key).await?)
    }

    async fn zadd(&self, key: &str, score: f64, member: &[u8]) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.zadd(key, member, score).await?;
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &[u8]) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.zrem(key, member).await?;
        Ok(())
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<Vec<u8>>> {
        let mut conn = self.conn().await?;
        Ok(conn.zrange(key, start, stop).await?)
    }

    async fn expire(&self, key: &str, seconds: i64) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.expire(key, seconds).await?;
        Ok(())
    }

    async fn persist(&self, key: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.persist(key).await?;
        Ok(())
    }

    async fn ttl(&self, key: &str) -> QueueResult<i64> {
        let mut conn = self.conn().await?;
        Ok(conn.ttl(key).await?)
    }

    async fn exists(&self, key: &str) -> QueueResult<bool> {
        let mut conn = self.conn().await?;
        Ok(conn.exists(key).await?)
    }

    async fn del(&self, key: &str) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn transaction(&self, ops: Vec<Op>) -> QueueResult<()> {
        let mut conn = self.conn().await?;
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in ops {
            match op {
                Op::HSet(key, fields) => {
                    for (field, value) in fields {
                        pipe.hset(&key, field, value);
                    }
                }
                Op::HDel(key, field) => {
                    pipe.hdel(&key, field);
                }
                Op::Sadd(key, value) => {
                    pipe.sadd(&key, value);
                }
                Op::Srem(key, value) => {
                    pipe.srem(&key, value);
                }
                Op::Rpush(key, value) => {
                    pipe.rpush(&key, value);
                }
                Op::Lpush(key, value) => {
                    pipe.lpush(&key, value);
                }
                Op::Lrem(key, value) => {
                    pipe.lrem(&key, 0, value);
                }
                Op::Zadd(key, score, member) => {
                    pipe.zadd(&key, member, score);
                }
                Op::Zrem(key, member) => {
                    pipe.zrem(&key, member);
                }
                Op::Expire(key, seconds) => {
                    pipe.expire(&key, seconds);
                }
                Op::Persist(key) => {
                    pipe.persist(&key);
                }
                Op::Del(key) => {
                    pipe.del(&key);
                }
            }
        }
        let _: () = pipe.query_async(&mut *conn).await?;
        Ok(())
    }
}

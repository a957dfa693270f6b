//! The store contract the protocol is built against.
//!
//! Every protocol operation takes a `&dyn Store` (or a generic `S: Store`)
//! as an explicit argument rather than reaching into process-global state —
//! see the design note on the source's "current connection" stack. Two
//! implementations exist: [`redis::RedisStore`] for production use, and
//! [`memory::MemoryStore`], an in-memory fake that lets the rest of this
//! crate's tests run without a live Redis server.

pub mod memory;
pub mod redis;

use crate::error::QueueResult;
use async_trait::async_trait;
use std::collections::HashMap;

pub use self::redis::RedisStore;
pub use memory::MemoryStore;

/// How long a blocking pop should wait.
#[derive(Debug, Clone, Copy)]
pub enum BlockFor {
    /// Block until an element is available.
    Forever,
    /// Block up to this many seconds.
    Seconds(u64),
    /// Return immediately if nothing is available.
    NonBlocking,
}

/// A single write issued as part of an atomic [`Store::transaction`] group.
/// Mirrors the Redis primitives named in the store contract; nothing here
/// assumes scripting support.
#[derive(Debug, Clone)]
pub enum Op {
    HSet(String, Vec<(String, Vec<u8>)>),
    HDel(String, String),
    Sadd(String, Vec<u8>),
    Srem(String, Vec<u8>),
    Rpush(String, Vec<u8>),
    Lpush(String, Vec<u8>),
    Lrem(String, Vec<u8>),
    Zadd(String, f64, Vec<u8>),
    Zrem(String, Vec<u8>),
    Expire(String, i64),
    Persist(String),
    Del(String),
}

/// The async key-value contract the protocol is built against.
#[async_trait]
pub trait Store: Send + Sync {
    async fn hset(&self, key: &str, fields: &[(&str, &[u8])]) -> QueueResult<()>;
    async fn hget(&self, key: &str, field: &str) -> QueueResult<Option<Vec<u8>>>;
    async fn hgetall(&self, key: &str) -> QueueResult<HashMap<String, Vec<u8>>>;
    async fn hdel(&self, key: &str, field: &str) -> QueueResult<()>;

    async fn rpush(&self, key: &str, value: &[u8]) -> QueueResult<()>;
    async fn lpush(&self, key: &str, value: &[u8]) -> QueueResult<()>;
    async fn lrange(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<Vec<u8>>>;
    async fn lrem(&self, key: &str, value: &[u8]) -> QueueResult<()>;
    async fn llen(&self, key: &str) -> QueueResult<usize>;
    /// Blocking pop across an ordered list of queue keys; returns the key
    /// that yielded an element alongside its value.
    async fn blpop(&self, keys: &[String], block: BlockFor) -> QueueResult<Option<(String, Vec<u8>)>>;

    async fn sadd(&self, key: &str, value: &[u8]) -> QueueResult<()>;
    async fn srem(&self, key: &str, value: &[u8]) -> QueueResult<()>;
    async fn smembers(&self, key: &str) -> QueueResult<Vec<Vec<u8>>>;

    async fn zadd(&self, key: &str, score: f64, member: &[u8]) -> QueueResult<()>;
    async fn zrem(&self, key: &str, member: &[u8]) -> QueueResult<()>;
    async fn zrange(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<Vec<u8>>>;

    async fn expire(&self, key: &str, seconds: i64) -> QueueResult<()>;
    async fn persist(&self, key: &str) -> QueueResult<()>;
    async fn ttl(&self, key: &str) -> QueueResult<i64>;
    async fn exists(&self, key: &str) -> QueueResult<bool>;
    async fn del(&self, key: &str) -> QueueResult<()>;

    /// Apply every op in `ops` as a single atomic unit (Redis MULTI/EXEC).
    async fn transaction(&self, ops: Vec<Op>) -> QueueResult<()>;
}

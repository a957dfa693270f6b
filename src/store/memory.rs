//! An in-memory [`Store`] fake for this crate's own tests.
//!
//! Mirrors Redis semantics closely enough for the protocol's scenario tests
//! (ordering, TTL policy, atomic transactions) without requiring a live
//! server. Not intended for production use.

use super::{BlockFor, Op, Store};
use crate::error::QueueResult;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Inner {
    hashes: HashMap<String, HashMap<String, Vec<u8>>>,
    lists: HashMap<String, VecDeque<Vec<u8>>>,
    sets: HashMap<String, HashSet<Vec<u8>>>,
    zsets: HashMap<String, Vec<(Vec<u8>, f64)>>,
    expirations: HashMap<String, Instant>,
}

impl Inner {
    fn sweep(&mut self, key: &str) {
        if let Some(expiry) = self.expirations.get(key) {
            if Instant::now() >= *expiry {
                self.hashes.remove(key);
                self.lists.remove(key);
                self.sets.remove(key);
                self.zsets.remove(key);
                self.expirations.remove(key);
            }
        }
    }

    fn exists(&mut self, key: &str) -> bool {
        self.sweep(key);
        self.hashes.contains_key(key)
            || self.lists.contains_key(key)
            || self.sets.contains_key(key)
            || self.zsets.contains_key(key)
    }

    fn apply(&mut self, op: Op) {
        match op {
            Op::HSet(key, fields) => {
                self.sweep(&key);
                let entry = self.hashes.entry(key).or_default();
                for (field, value) in fields {
                    entry.insert(field, value);
                }
            }
            Op::HDel(key, field) => {
                self.sweep(&key);
                if let Some(hash) = self.hashes.get_mut(&key) {
                    hash.remove(&field);
                }
            }
            Op::Sadd(key, value) => {
                self.sweep(&key);
                self.sets.entry(key).or_default().insert(value);
            }
            Op::Srem(key, value) => {
                self.sweep(&key);
                if let Some(set) = self.sets.get_mut(&key) {
                    set.remove(&value);
                }
            }
            Op::Rpush(key, value) => {
                self.sweep(&key);
                self.lists.entry(key).or_default().push_back(value);
            }
            Op::Lpush(key, value) => {
                self.sweep(&key);
                self.lists.entry(key).or_default().push_front(value);
            }
            Op::Lrem(key, value) => {
                self.sweep(&key);
                if let Some(list) = self.lists.get_mut(&key) {
                    list.retain(|v| v != &value);
                }
            }
            Op::Zadd(key, score, member) => {
                self.sweep(&key);
                let zset = self.zsets.entry(key).or_default();
                zset.retain(|(m, _)| m != &member);
                zset.push((member, score));
                zset.sort_by(|a, b| a.1.total_cmp(&b.1));
            }
            Op::Zrem(key, member) => {
                self.sweep(&key);
                if let Some(zset) = self.zsets.get_mut(&key) {
                    zset.retain(|(m, _)| m != &member);
                }
            }
            Op::Expire(key, seconds) => {
                self.expirations
                    .insert(key, Instant::now() + Duration::from_secs(seconds.max(0) as u64));
            }
            Op::Persist(key) => {
                self.expirations.remove(&key);
            }
            Op::Del(key) => {
                self.hashes.remove(&key);
                self.lists.remove(&key);
                self.sets.remove(&key);
                self.zsets.remove(&key);
                self.expirations.remove(&key);
            }
        }
    }
}

/// In-memory fake of the Redis-backed store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn range(len: usize, start: isize, stop: isize) -> (usize, usize) {
    let len = len as isize;
    let norm = |i: isize| -> isize {
        if i < 0 {
            (len + i).max(0)
        } else {
            i.min(len)
        }
    };
    let start = norm(start);
    let stop = if stop < 0 { norm(stop) } else { stop.min(len - 1) };
    if len == 0 || start > stop {
        (0, 0)
    } else {
        (start as usize, (stop + 1) as usize)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn hset(&self, key: &str, fields: &[(&str, &[u8])]) -> QueueResult<()> {
        let owned = fields
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_vec()))
            .collect();
        self.inner.lock().apply(Op::HSet(key.to_string(), owned));
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> QueueResult<Option<Vec<u8>>> {
        let mut inner = self.inner.lock();
        inner.sweep(key);
        Ok(inner.hashes.get(key).and_then(|h| h.get(field).cloned()))
    }

    async fn hgetall(&self, key: &str) -> QueueResult<HashMap<String, Vec<u8>>> {
        let mut inner = self.inner.lock();
        inner.sweep(key);
        Ok(inner.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn hdel(&self, key: &str, field: &str) -> QueueResult<()> {
        self.inner
            .lock()
            .apply(Op::HDel(key.to_string(), field.to_string()));
        Ok(())
    }

    async fn rpush(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        self.inner
            .lock()
            .apply(Op::Rpush(key.to_string(), value.to_vec()));
        Ok(())
    }

    async fn lpush(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        self.inner
            .lock()
            .apply(Op::Lpush(key.to_string(), value.to_vec()));
        Ok(())
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<Vec<u8>>> {
        let mut inner = self.inner.lock();
        inner.sweep(key);
        let list = match inner.lists.get(key) {
            Some(l) => l,
            None => return Ok(Vec::new()),
        };
        let (from, to) = range(list.len(), start, stop);
        Ok(list.iter().skip(from).take(to - from).cloned().collect())
    }

    async fn lrem(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        self.inner
            .lock()
            .apply(Op::Lrem(key.to_string(), value.to_vec()));
        Ok(())
    }

    async fn llen(&self, key: &str) -> QueueResult<usize> {
        let mut inner = self.inner.lock();
        inner.sweep(key);
        Ok(inner.lists.get(key).map(|l| l.len()).unwrap_or(0))
    }

    async fn blpop(&self, keys: &[String], block: BlockFor) -> QueueResult<Option<(String, Vec<u8>)>> {
        let deadline = match block {
            BlockFor::Forever => None,
            BlockFor::Seconds(s) => Some(Instant::now() + Duration::from_secs(s)),
            BlockFor::NonBlocking => Some(Instant::now()),
        };
        loop {
            {
                let mut inner = self.inner.lock();
                for key in keys {
                    inner.sweep(key);
                    if let Some(list) = inner.lists.get_mut(key) {
                        if let Some(value) = list.pop_front() {
                            return Ok(Some((key.clone(), value)));
                        }
                    }
                }
            }
            match deadline {
                Some(d) if Instant::now() >= d => return Ok(None),
                _ => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        }
    }

    async fn sadd(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        self.inner
            .lock()
            .apply(Op::Sadd(key.to_string(), value.to_vec()));
        Ok(())
    }

    async fn srem(&self, key: &str, value: &[u8]) -> QueueResult<()> {
        self.inner
            .lock()
            .apply(Op::Srem(key.to_string(), value.to_vec()));
        Ok(())
    }

    async fn smembers(&self, key: &str) -> QueueResult<Vec<Vec<u8>>> {
        let mut inner = self.inner.lock();
        inner.sweep(key);
        Ok(inner
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn zadd(&self, key: &str, score: f64, member: &[u8]) -> QueueResult<()> {
        self.inner
            .lock()
            .apply(Op::Zadd(key.to_string(), score, member.to_vec()));
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &[u8]) -> QueueResult<()> {
        self.inner
            .lock()
            .apply(Op::Zrem(key.to_string(), member.to_vec()));
        Ok(())
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> QueueResult<Vec<Vec<u8>>> {
        let mut inner = self.inner.lock();
        inner.sweep(key);
        let zset = match inner.zsets.get(key) {
            Some(z) => z,
            None => return Ok(Vec::new()),
        };
        let (from, to) = range(zset.len(), start, stop);
        Ok(zset[from..to].iter().map(|(m, _)| m.clone()).collect())
    }

    async fn expire(&self, key: &str, seconds: i64) -> QueueResult<()> {
        self.inner.lock().apply(Op::Expire(key.to_string(), seconds));
        Ok(())
    }

    async fn persist(&self, key: &str) -> QueueResult<()> {
        self.inner.lock().apply(Op::Persist(key.to_string()));
        Ok(())
    }

    async fn ttl(&self, key: &str) -> QueueResult<i64> {
        let mut inner = self.inner.lock();
        if !inner.exists(key) {
            return Ok(-2);
        }
        match inner.expirations.get(key) {
            Some(expiry) => {
                let remaining = expiry.saturating_duration_since(Instant::now());
                Ok(remaining.as_millis().div_ceil(1000) as i64)
            }
            None => Ok(-1),
        }
    }

    async fn exists(&self, key: &str) -> QueueResult<bool> {
        Ok(self.inner.lock().exists(key))
    }

    async fn del(&self, key: &str) -> QueueResult<()> {
        self.inner.lock().apply(Op::Del(key.to_string()));
        Ok(())
    }

    async fn transaction(&self, ops: Vec<Op>) -> QueueResult<()> {
        let mut inner = self.inner.lock();
        for op in ops {
            inner.apply(op);
        }
        Ok(())
    }
}

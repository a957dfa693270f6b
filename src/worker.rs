//! The worker protocol: birth, death, shutdown requests, heartbeats.
//!
//! Unlike [`crate::store::redis::RedisStore`]'s former in-process worker
//! registry in the codebase this was grounded on, worker liveness here is
//! entirely store-resident: a worker is live iff its hash exists and has
//! not had `death` recorded. The TTL on that hash is what lets a crashed
//! worker's liveness expire without anyone explicitly marking it dead.

use crate::codec::{format_timestamp, WorkerStatus};
use crate::config::PolicyConfig;
use crate::error::{QueueError, QueueResult};
use crate::keys::Keys;
use crate::metrics;
use crate::store::Store;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Opaque worker identifier (recommended: `host:pid` or similar).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerId(pub String);

impl From<&str> for WorkerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for WorkerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The worker-liveness protocol, operating against an injected [`Store`].
pub struct WorkerRegistry {
    store: Arc<dyn Store>,
    keys: Keys,
    policy: PolicyConfig,
}

impl WorkerRegistry {
    pub fn new(store: Arc<dyn Store>, keys: Keys, policy: PolicyConfig) -> Self {
        Self { store, keys, policy }
    }

    /// Register a new worker. Fails with [`QueueError::DoubleBirth`] if
    /// `worker` is already registered; a custom `ttl` overrides the
    /// configured default.
    pub async fn birth(
        &self,
        worker: &WorkerId,
        queue_names: &[String],
        ttl: Option<i64>,
    ) -> QueueResult<()> {
        let worker_key = self.keys.worker(&worker.0);
        if self.store.exists(&worker_key).await? {
            return Err(QueueError::DoubleBirth(worker.0.clone()));
        }
        // Residue from a worker that died without its TTL having expired yet.
        self.store.del(&worker_key).await?;

        let now = format_timestamp(Utc::now());
        let joined_queues = queue_names.join(",");
        self.store
            .hset(
                &worker_key,
                &[
                    ("birth", now.as_bytes()),
                    ("queues", joined_queues.as_bytes()),
                    ("status", WorkerStatus::Started.as_str().as_bytes()),
                ],
            )
            .await?;
        self.store
            .expire(&worker_key, ttl.unwrap_or(self.policy.worker_ttl_secs))
            .await?;
        self.store.sadd(&self.keys.workers(), worker_key.as_bytes()).await?;
        self.refresh_active_gauge().await?;

        info!(worker = %worker, "worker registered");
        Ok(())
    }

    /// Mark `worker` dead: records `death`, drops its residual TTL to the
    /// configured death window, and removes it from the live set.
    pub async fn death(&self, worker: &WorkerId) -> QueueResult<()> {
        let worker_key = self.keys.worker(&worker.0);
        let now = format_timestamp(Utc::now());
        self.store.hset(&worker_key, &[("death", now.as_bytes())]).await?;
        self.store.expire(&worker_key, self.policy.worker_death_ttl_secs).await?;
        self.store.srem(&self.keys.workers(), worker_key.as_bytes()).await?;
        self.refresh_active_gauge().await?;
        info!(worker = %worker, "worker died");
        Ok(())
    }

    async fn refresh_active_gauge(&self) -> QueueResult<()> {
        let count = self.store.smembers(&self.keys.workers()).await?.len();
        metrics::set_gauge(metrics::names::WORKERS_ACTIVE, count as f64);
        Ok(())
    }

    /// Record a cooperative shutdown request; the worker's own run loop is
    /// responsible for polling this field and stopping gracefully.
    pub async fn shutdown_requested(&self, worker: &WorkerId) -> QueueResult<()> {
        let worker_key = self.keys.worker(&worker.0);
        let now = format_timestamp(Utc::now());
        self.store
            .hset(&worker_key, &[("shutdown_requested_date", now.as_bytes())])
            .await?;
        debug!(worker = %worker, "shutdown requested");
        Ok(())
    }

    /// Refresh `worker`'s liveness TTL. Call around every dequeue and,
    /// while idle, at least every `ttl/2` seconds.
    pub async fn heartbeat(&self, worker: &WorkerId, ttl: Option<i64>) -> QueueResult<()> {
        let worker_key = self.keys.worker(&worker.0);
        self.store
            .expire(&worker_key, ttl.unwrap_or(self.policy.worker_ttl_secs))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::store::MemoryStore;

    fn registry() -> WorkerRegistry {
        WorkerRegistry::new(Arc::new(MemoryStore::new()), Keys::from_config(&StoreConfig::default()), PolicyConfig::default())
    }

    #[tokio::test]
    async fn birth_registers_worker_with_defaults() {
        let r = registry();
        let worker = WorkerId::from("foo");
        r.birth(&worker, &["bar".to_string(), "baz".to_string()], None).await.unwrap();

        let members = r.store.smembers(&r.keys.workers()).await.unwrap();
        assert_eq!(members, vec![r.keys.worker("foo").into_bytes()]);

        let queues = r.store.hget(&r.keys.worker("foo"), "queues").await.unwrap().unwrap();
        assert_eq!(queues, b"bar,baz");
        let status = r.store.hget(&r.keys.worker("foo"), "status").await.unwrap().unwrap();
        assert_eq!(status, b"started");
        assert_eq!(r.store.ttl(&r.keys.worker("foo")).await.unwrap(), 420);
    }

    #[tokio::test]
    async fn double_birth_is_rejected() {
        let r = registry();
        let worker = WorkerId::from("foo");
        r.birth(&worker, &[], None).await.unwrap();
        let err = r.birth(&worker, &[], None).await.unwrap_err();
        assert!(matches!(err, QueueError::DoubleBirth(_)));
    }

    #[tokio::test]
    async fn death_clears_membership_and_shortens_ttl() {
        let r = registry();
        let worker = WorkerId::from("foo");
        r.birth(&worker, &[], None).await.unwrap();
        r.death(&worker).await.unwrap();

        let members = r.store.smembers(&r.keys.workers()).await.unwrap();
        assert!(members.is_empty());
        assert_eq!(r.store.ttl(&r.keys.worker("foo")).await.unwrap(), 60);
    }

    #[tokio::test]
    async fn shutdown_requested_sets_field() {
        let r = registry();
        let worker = WorkerId::from("foo");
        r.birth(&worker, &[], None).await.unwrap();
        r.shutdown_requested(&worker).await.unwrap();
        assert!(r
            .store
            .hget(&r.keys.worker("foo"), "shutdown_requested_date")
            .await
            .unwrap()
            .is_some());
    }
}

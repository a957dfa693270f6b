//! Read-only listings over queues, jobs, and workers. Never mutates.

use crate::codec::JobStatus;
use crate::error::QueueResult;
use crate::job::JobId;
use crate::keys::Keys;
use crate::store::Store;
use std::sync::Arc;

/// The query surface, operating against an injected [`Store`].
pub struct Query {
    store: Arc<dyn Store>,
    keys: Keys,
}

impl Query {
    pub fn new(store: Arc<dyn Store>, keys: Keys) -> Self {
        Self { store, keys }
    }

    /// All known queue names (including `failed`, once it has been used).
    pub async fn queues(&self) -> QueueResult<Vec<String>> {
        let raw = self.store.smembers(&self.keys.queues()).await?;
        Ok(raw.into_iter().map(|b| String::from_utf8_lossy(&b).into_owned()).collect())
    }

    /// Job ids pending on `queue`, `start..=end` (Redis `LRANGE` semantics:
    /// negative indices count from the tail, `-1` means the last element).
    pub async fn jobs(&self, queue: &str, start: isize, end: isize) -> QueueResult<Vec<JobId>> {
        let raw = self.store.lrange(&self.keys.queue(queue), start, end).await?;
        Ok(raw.into_iter().map(|b| JobId::from(String::from_utf8_lossy(&b).into_owned())).collect())
    }

    /// Current lifecycle status of `id`, if it has a hash.
    pub async fn job_status(&self, id: &JobId) -> QueueResult<Option<JobStatus>> {
        let raw = self.store.hget(&self.keys.job(&id.0), "status").await?;
        Ok(raw.and_then(|v| JobStatus::parse(&String::from_utf8_lossy(&v))))
    }

    /// Job ids currently started (in progress) on `queue`.
    pub async fn started_jobs(&self, queue: &str, start: isize, end: isize) -> QueueResult<Vec<JobId>> {
        self.zrange_ids(&self.keys.wip(queue), start, end).await
    }

    /// Job ids finished on `queue`.
    pub async fn finished_jobs(&self, queue: &str, start: isize, end: isize) -> QueueResult<Vec<JobId>> {
        self.zrange_ids(&self.keys.finished(queue), start, end).await
    }

    /// Job ids deferred on `queue`, awaiting a dependency.
    pub async fn deferred_jobs(&self, queue: &str, start: isize, end: isize) -> QueueResult<Vec<JobId>> {
        self.zrange_ids(&self.keys.deferred(queue), start, end).await
    }

    async fn zrange_ids(&self, key: &str, start: isize, end: isize) -> QueueResult<Vec<JobId>> {
        let raw = self.store.zrange(key, start, end).await?;
        Ok(raw.into_iter().map(|b| JobId::from(String::from_utf8_lossy(&b).into_owned())).collect())
    }

    /// Number of job ids pending on `queue`.
    pub async fn queue_length(&self, queue: &str) -> QueueResult<usize> {
        self.store.llen(&self.keys.queue(queue)).await
    }

    /// Every live worker key.
    pub async fn workers(&self) -> QueueResult<Vec<String>> {
        let raw = self.store.smembers(&self.keys.workers()).await?;
        Ok(raw.into_iter().map(|b| String::from_utf8_lossy(&b).into_owned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobSpec;
    use crate::queue::JobQueue;
    use crate::config::{PolicyConfig, StoreConfig};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn lists_queues_and_jobs() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let keys = Keys::from_config(&StoreConfig::default());
        let protocol = JobQueue::new(store.clone(), keys.clone(), PolicyConfig::default());
        let query = Query::new(store, keys);

        let id = JobId::from("abc");
        protocol
            .enqueue("default", &id, JobSpec { data: b"x".to_vec(), ..Default::default() }, false)
            .await
            .unwrap();

        assert_eq!(query.queues().await.unwrap(), vec!["default".to_string()]);
        assert_eq!(query.jobs("default", 0, -1).await.unwrap(), vec![id.clone()]);
        assert_eq!(query.job_status(&id).await.unwrap(), Some(JobStatus::Queued));
        assert_eq!(query.queue_length("default").await.unwrap(), 1);
    }
}

//! The job protocol: enqueue, dequeue, cancel, start, finish, fail, requeue.

use crate::codec::{format_timestamp, JobStatus, WorkerStatus};
use crate::config::PolicyConfig;
use crate::error::{QueueError, QueueResult};
use crate::job::{JobId, JobRecord, JobSpec, ResultTtl};
use crate::keys::{Keys, FAILED_QUEUE};
use crate::metrics;
use crate::store::{BlockFor, Op, Store};
use crate::worker::WorkerId;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn encode_result_ttl(ttl: ResultTtl) -> Vec<u8> {
    match ttl {
        ResultTtl::Immediate => b"0".to_vec(),
        ResultTtl::Seconds(n) => n.to_string().into_bytes(),
        ResultTtl::Forever => b"None".to_vec(),
    }
}

/// The job-queue protocol, operating against an injected [`Store`].
pub struct JobQueue {
    store: Arc<dyn Store>,
    keys: Keys,
    policy: PolicyConfig,
}

impl JobQueue {
    pub fn new(store: Arc<dyn Store>, keys: Keys, policy: PolicyConfig) -> Self {
        Self { store, keys, policy }
    }

    /// `HGET rq:job:<id> status`, parsed. `None` if the job hash doesn't exist.
    pub async fn job_status(&self, id: &JobId) -> QueueResult<Option<JobStatus>> {
        let raw = self.store.hget(&self.keys.job(&id.0), "status").await?;
        Ok(raw.and_then(|v| JobStatus::parse(&bytes_to_string(&v))))
    }

    /// Enqueue `id` onto `queue`, deferring it if its dependency hasn't
    /// finished yet. Returns the resulting status and, if activated, the
    /// `enqueued_at` timestamp.
    pub async fn enqueue(
        &self,
        queue: &str,
        id: &JobId,
        spec: JobSpec,
        at_front: bool,
    ) -> QueueResult<(JobStatus, Option<String>)> {
        let now = Utc::now();
        let now_str = format_timestamp(now);
        let job_key = self.keys.job(&id.0);

        let mut fields: Vec<(String, Vec<u8>)> = vec![
            ("data".into(), spec.data),
            ("description".into(), spec.description.into_bytes()),
            ("created_at".into(), now_str.clone().into_bytes()),
            ("origin".into(), queue.as_bytes().to_vec()),
        ];
        if let Some(timeout) = spec.timeout {
            fields.push(("timeout".into(), timeout.to_string().into_bytes()));
        }
        if let Some(ttl) = spec.result_ttl {
            fields.push(("result_ttl".into(), encode_result_ttl(ttl)));
        }
        fields.extend(spec.extra);

        let mut ops = vec![Op::Sadd(self.keys.queues(), queue.as_bytes().to_vec())];

        let defer = match &spec.dependency_id {
            Some(dep) => self.job_status(dep).await? != Some(JobStatus::Finished),
            None => false,
        };

        let (status, enqueued_at) = if defer {
            let dep = spec.dependency_id.as_ref().expect("defer implies a dependency");
            fields.push(("status".into(), JobStatus::Deferred.as_str().as_bytes().to_vec()));
            fields.push(("dependency_id".into(), dep.0.clone().into_bytes()));
            ops.push(Op::Zadd(self.keys.deferred(queue), now.timestamp() as f64, id.0.clone().into_bytes()));
            ops.push(Op::Sadd(self.keys.dependents(&dep.0), id.0.clone().into_bytes()));
            (JobStatus::Deferred, None)
        } else {
            fields.push(("status".into(), JobStatus::Queued.as_str().as_bytes().to_vec()));
            fields.push(("enqueued_at".into(), now_str.clone().into_bytes()));
            ops.push(if at_front {
                Op::Lpush(self.keys.queue(queue), id.0.clone().into_bytes())
            } else {
                Op::Rpush(self.keys.queue(queue), id.0.clone().into_bytes())
            });
            (JobStatus::Queued, Some(now_str))
        };

        ops.push(Op::HSet(job_key, fields));
        self.store.transaction(ops).await?;

        metrics::inc(if defer {
            metrics::names::JOBS_DEFERRED_TOTAL
        } else {
            metrics::names::JOBS_ENQUEUED_TOTAL
        });
        debug!(job_id = %id, queue, status = %status, "enqueued job");

        Ok((status, enqueued_at))
    }

    /// Blocking pop across `queues`, in order. `Ok(None)` on a non-fatal
    /// timeout — callers must treat that as normal flow control, not an
    /// error (this is the `DequeueTimeout` signal from the error taxonomy).
    pub async fn dequeue(&self, queues: &[String], block: BlockFor) -> QueueResult<Option<JobRecord>> {
        let list_keys: Vec<String> = queues.iter().map(|q| self.keys.queue(q)).collect();
        loop {
            let popped = self.store.blpop(&list_keys, block).await?;
            let (_, id_bytes) = match popped {
                Some(v) => v,
                None => return Ok(None),
            };
            let id = JobId::from(bytes_to_string(&id_bytes));
            let hash = self.store.hgetall(&self.keys.job(&id.0)).await?;
            if hash.is_empty() {
                warn!(job_id = %id, "orphan job id skipped during dequeue");
                continue;
            }
            metrics::inc(metrics::names::JOBS_DEQUEUED_TOTAL);
            return Ok(JobRecord::from_hash(id, hash));
        }
    }

    /// Remove `id` from `queue`'s list. Idempotent; does not touch the hash.
    pub async fn cancel(&self, queue: &str, id: &JobId) -> QueueResult<()> {
        self.store.lrem(&self.keys.queue(queue), id.0.as_bytes()).await?;
        metrics::inc(metrics::names::JOBS_CANCELLED_TOTAL);
        Ok(())
    }

    /// Delete every job hash currently on `queue` and clear the list.
    /// Dependents of the deleted jobs are intentionally left untouched —
    /// preserving the upstream gap (see the design notes).
    pub async fn empty_queue(&self, queue: &str) -> QueueResult<u64> {
        let ids = self.store.lrange(&self.keys.queue(queue), 0, -1).await?;
        let mut ops = vec![Op::Del(self.keys.queue(queue))];
        for id in &ids {
            ops.push(Op::Del(self.keys.job(&bytes_to_string(id))));
        }
        self.store.transaction(ops).await?;
        Ok(ids.len() as u64)
    }

    /// Mark `id` started: status flips, the hash is persisted (no TTL),
    /// and it joins `queue`'s work-in-progress registry. If `worker` is
    /// given, the same transaction records it as the job's owner.
    pub async fn start(&self, queue: &str, id: &JobId, worker: Option<&WorkerId>) -> QueueResult<()> {
        let job_key = self.keys.job(&id.0);
        let now = Utc::now();
        let mut ops = vec![
            Op::HSet(
                job_key.clone(),
                vec![
                    ("status".into(), JobStatus::Started.as_str().as_bytes().to_vec()),
                    ("started_at".into(), format_timestamp(now).into_bytes()),
                ],
            ),
            Op::Persist(job_key),
            Op::Zadd(self.keys.wip(queue), now.timestamp() as f64, id.0.clone().into_bytes()),
        ];
        if let Some(worker) = worker {
            ops.push(Op::HSet(
                self.keys.worker(&worker.0),
                vec![
                    ("current_job".into(), id.0.clone().into_bytes()),
                    ("status".into(), WorkerStatus::Busy.as_str().as_bytes().to_vec()),
                ],
            ));
        }
        self.store.transaction(ops).await?;
        metrics::inc(metrics::names::JOBS_STARTED_TOTAL);
        Ok(())
    }

    /// Mark `id` finished, apply its `result_ttl` policy, and release any
    /// dependents waiting on it back onto their own origin queues. The
    /// queue a job is removed from `wip`/added to `finished` on is always
    /// its own stored `origin`, never a caller-supplied value.
    pub async fn finish(&self, id: &JobId, result_ttl: Option<ResultTtl>) -> QueueResult<()> {
        let job_key = self.keys.job(&id.0);
        let origin = match self.store.hget(&job_key, "origin").await? {
            Some(v) => bytes_to_string(&v),
            None => return Err(QueueError::NoSuchJob(id.0.clone())),
        };
        let now = Utc::now();

        let mut ops = vec![
            Op::HSet(
                job_key.clone(),
                vec![
                    ("status".into(), JobStatus::Finished.as_str().as_bytes().to_vec()),
                    ("ended_at".into(), format_timestamp(now).into_bytes()),
                ],
            ),
            Op::Zrem(self.keys.wip(&origin), id.0.clone().into_bytes()),
            Op::Zadd(self.keys.finished(&origin), now.timestamp() as f64, id.0.clone().into_bytes()),
        ];
        let effective_ttl = result_ttl.unwrap_or(ResultTtl::Seconds(self.policy.default_result_ttl_secs));
        ops.push(match effective_ttl {
            ResultTtl::Immediate => Op::Del(job_key.clone()),
            ResultTtl::Seconds(n) => Op::Expire(job_key.clone(), n),
            ResultTtl::Forever => Op::Persist(job_key.clone()),
        });
        self.store.transaction(ops).await?;
        metrics::inc(metrics::names::JOBS_FINISHED_TOTAL);

        self.release_dependents(id).await
    }

    async fn release_dependents(&self, id: &JobId) -> QueueResult<()> {
        let dependents_key = self.keys.dependents(&id.0);
        let dependents = self.store.smembers(&dependents_key).await?;
        for dep_bytes in &dependents {
            let dep_id = JobId::from(bytes_to_string(dep_bytes));
            let dep_job_key = self.keys.job(&dep_id.0);
            let status = self.store.hget(&dep_job_key, "status").await?;
            if status.as_deref().map(bytes_to_string) != Some(JobStatus::Deferred.as_str().to_string()) {
                continue;
            }
            let origin = match self.store.hget(&dep_job_key, "origin").await? {
                Some(v) => bytes_to_string(&v),
                None => continue,
            };
            let now_str = format_timestamp(Utc::now());
            let ops = vec![
                Op::Zrem(self.keys.deferred(&origin), dep_id.0.clone().into_bytes()),
                Op::HSet(
                    dep_job_key,
                    vec![
                        ("status".into(), JobStatus::Queued.as_str().as_bytes().to_vec()),
                        ("enqueued_at".into(), now_str.into_bytes()),
                    ],
                ),
                Op::Rpush(self.keys.queue(&origin), dep_id.0.clone().into_bytes()),
            ];
            self.store.transaction(ops).await?;
            debug!(job_id = %dep_id, "released dependent job");
        }
        if !dependents.is_empty() {
            self.store.del(&dependents_key).await?;
        }
        Ok(())
    }

    /// Quarantine `id` to the failure queue. Does not touch `queue`'s
    /// origin list (invariant 1 is maintained by the prior `wip` removal).
    pub async fn fail(&self, queue: &str, id: &JobId, exc_info: Vec<u8>) -> QueueResult<()> {
        let job_key = self.keys.job(&id.0);
        if !self.store.exists(&job_key).await? {
            return Err(QueueError::NoSuchJob(id.0.clone()));
        }
        let now = format_timestamp(Utc::now());
        let ops = vec![
            Op::HSet(
                job_key,
                vec![
                    ("status".into(), JobStatus::Failed.as_str().as_bytes().to_vec()),
                    ("ended_at".into(), now.into_bytes()),
                    ("exc_info".into(), exc_info),
                ],
            ),
            Op::Zrem(self.keys.wip(queue), id.0.clone().into_bytes()),
            Op::Rpush(self.keys.queue(FAILED_QUEUE), id.0.clone().into_bytes()),
            Op::Sadd(self.keys.queues(), FAILED_QUEUE.as_bytes().to_vec()),
        ];
        self.store.transaction(ops).await?;
        metrics::inc(metrics::names::JOBS_FAILED_TOTAL);
        Ok(())
    }

    /// Move a failed job back onto its origin queue.
    pub async fn requeue(&self, id: &JobId) -> QueueResult<()> {
        let job_key = self.keys.job(&id.0);
        let hash = self.store.hgetall(&job_key).await?;
        if hash.is_empty() {
            // Stale entry: the job hash is gone but its id still sits in
            // the failure list. Clean it up and return, matching the
            // upstream behavior of silently dropping dangling entries.
            self.store.lrem(&self.keys.queue(FAILED_QUEUE), id.0.as_bytes()).await?;
            return Ok(());
        }
        let status = hash
            .get("status")
            .and_then(|v| JobStatus::parse(&bytes_to_string(v)));
        if status != Some(JobStatus::Failed) {
            return Err(QueueError::InvalidOperation(format!(
                "cannot requeue job {id} with status {status:?}, expected failed"
            )));
        }
        let origin = hash
            .get("origin")
            .map(|v| bytes_to_string(v))
            .ok_or_else(|| QueueError::InvalidOperation(format!("job {id} has no origin queue")))?;

        let ops = vec![
            Op::HDel(job_key.clone(), "exc_info".to_string()),
            Op::HSet(job_key, vec![("status".into(), JobStatus::Queued.as_str().as_bytes().to_vec())]),
            Op::Lrem(self.keys.queue(FAILED_QUEUE), id.0.clone().into_bytes()),
            Op::Rpush(self.keys.queue(&origin), id.0.clone().into_bytes()),
        ];
        self.store.transaction(ops).await?;
        metrics::inc(metrics::names::JOBS_REQUEUED_TOTAL);
        Ok(())
    }
}

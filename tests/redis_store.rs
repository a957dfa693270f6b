//! Integration tests for `RedisStore` against a real Redis container.
//!
//! These exercise the same S1-S6 scenarios the unit tests run against
//! `MemoryStore`, but against a live server, using testcontainers to manage
//! the container lifecycle. Requires Docker to be available on the system.

use rq_protocol::store::BlockFor;
use rq_protocol::{JobId, JobQueue, JobSpec, Keys, PolicyConfig, Query, RedisStore, Store, WorkerId, WorkerRegistry};
use std::sync::Arc;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::redis::Redis;

struct TestStore {
    _container: ContainerAsync<Redis>,
    store: Arc<RedisStore>,
    config: rq_protocol::StoreConfig,
}

impl TestStore {
    async fn new() -> Self {
        let container = Redis::default().start().await.expect("failed to start redis container");
        let port = container.get_host_port_ipv4(6379).await.expect("failed to get redis port");
        let url = format!("redis://127.0.0.1:{port}");
        let config = rq_protocol::StoreConfig { url, ..Default::default() };
        let store = RedisStore::connect(&config).await.expect("failed to connect to redis");
        Self { _container: container, store: Arc::new(store), config }
    }

    fn keys(&self) -> Keys {
        Keys::from_config(&self.config)
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn enqueue_dequeue_round_trip_against_real_redis() {
    let harness = TestStore::new().await;
    let queue = JobQueue::new(harness.store.clone(), harness.keys(), PolicyConfig::default());

    let id = JobId::from("2a5079e7-387b-492f-a81c-68aa55c194c8");
    let spec = JobSpec {
        data: b"fixtures.some_calculation(3, 4, z=2)".to_vec(),
        description: "fixtures.some_calculation(3, 4, z=2)".into(),
        timeout: Some(180),
        ..Default::default()
    };
    let (status, enqueued_at) = queue.enqueue("default", &id, spec, false).await.unwrap();
    assert_eq!(status, rq_protocol::JobStatus::Queued);
    assert!(enqueued_at.is_some());

    let record = queue
        .dequeue(&["default".to_string()], BlockFor::NonBlocking)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.origin.as_deref(), Some("default"));
    assert_eq!(harness.store.llen(&harness.keys().queue("default")).await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn dependency_defers_then_releases_against_real_redis() {
    let harness = TestStore::new().await;
    let queue = JobQueue::new(harness.store.clone(), harness.keys(), PolicyConfig::default());

    let parent = JobId::from("56e6ba45-1aa3-4724-8c9f-51b7b0031cee");
    let child = JobId::from("2a5079e7-387b-492f-a81c-68aa55c194c8");
    queue
        .enqueue("default", &parent, JobSpec { data: b"p".to_vec(), ..Default::default() }, false)
        .await
        .unwrap();
    let (status, _) = queue
        .enqueue(
            "default",
            &child,
            JobSpec { data: b"c".to_vec(), dependency_id: Some(parent.clone()), ..Default::default() },
            false,
        )
        .await
        .unwrap();
    assert_eq!(status, rq_protocol::JobStatus::Deferred);

    let record = queue.dequeue(&["default".to_string()], BlockFor::NonBlocking).await.unwrap().unwrap();
    assert_eq!(record.id, parent);
    let worker = WorkerId::from("w1");
    queue.start("default", &parent, Some(&worker)).await.unwrap();
    assert_eq!(
        harness.store.hget(&harness.keys().worker(&worker.0), "status").await.unwrap().unwrap(),
        b"busy"
    );
    queue.finish(&parent, None).await.unwrap();

    assert_eq!(queue.job_status(&child).await.unwrap(), Some(rq_protocol::JobStatus::Queued));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn worker_lifecycle_against_real_redis() {
    let harness = TestStore::new().await;
    let registry = WorkerRegistry::new(harness.store.clone(), harness.keys(), PolicyConfig::default());
    let query = Query::new(harness.store.clone(), harness.keys());

    let worker = WorkerId::from("foo");
    registry.birth(&worker, &["bar".to_string(), "baz".to_string()], None).await.unwrap();
    assert_eq!(query.workers().await.unwrap(), vec!["rq:worker:foo".to_string()]);

    registry.death(&worker).await.unwrap();
    assert!(query.workers().await.unwrap().is_empty());
}

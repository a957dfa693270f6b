//! rq-protocol: the protocol layer of a distributed, Redis-backed job queue.
//!
//! Producers enqueue opaque jobs onto named queues; workers on arbitrary
//! hosts dequeue and execute them; results, failures, dependencies, and
//! worker liveness are all reflected as state in the backing store, so no
//! in-memory coordination between producers and workers is required.
//!
//! This crate is the hard part only: the exact mapping of queue/job/worker
//! lifecycle operations onto a set of key-value primitives. It does not
//! include the transport client itself (see [`store::Store`]), a payload
//! codec, user-facing façades, or job execution.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          rq-protocol                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  Producer                              Worker                    │
//! │     │                                     │                      │
//! │     ▼                                     ▼                      │
//! │  enqueue()                         dequeue()/start()/             │
//! │     │                              finish()/fail()                │
//! │     ▼                                     │                      │
//! │  ┌────────────────────────────────────────┴─────────────────┐    │
//! │  │                     Store (trait)                         │    │
//! │  │   rq:queue:<name>   rq:job:<id>    rq:wip:<name>           │    │
//! │  │   rq:deferred:<name> rq:finished:<name> rq:queue:failed    │    │
//! │  │   rq:workers   rq:worker:<name>                            │    │
//! │  └────────────────────────────────────────────────────────────┘   │
//! │                RedisStore (production) / MemoryStore (tests)      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use rq_protocol::{JobId, JobQueue, JobSpec, Keys, MemoryStore, PolicyConfig, StoreConfig};
//! use rq_protocol::store::BlockFor;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::new());
//! let keys = Keys::from_config(&StoreConfig::default());
//! let queue = JobQueue::new(store, keys, PolicyConfig::default());
//!
//! let id = JobId::generate();
//! queue.enqueue("default", &id, JobSpec { data: b"payload".to_vec(), ..Default::default() }, false)
//!     .await
//!     .unwrap();
//!
//! let job = queue.dequeue(&["default".to_string()], BlockFor::NonBlocking).await.unwrap().unwrap();
//! assert_eq!(job.id, id);
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod job;
pub mod keys;
pub mod metrics;
pub mod query;
pub mod queue;
pub mod store;
pub mod worker;

pub use codec::{JobStatus, WorkerStatus};
pub use config::{PolicyConfig, QueueConfig, StoreConfig};
pub use error::{QueueError, QueueResult};
pub use job::{JobId, JobRecord, JobSpec, ResultTtl};
pub use keys::{Keys, FAILED_QUEUE};
pub use metrics::register_metrics;
pub use query::Query;
pub use queue::JobQueue;
pub use store::{MemoryStore, RedisStore, Store};
pub use worker::{WorkerId, WorkerRegistry};

/// Re-exports of the commonly used traits and types.
pub mod prelude {
    pub use crate::codec::JobStatus;
    pub use crate::job::{JobId, JobRecord, JobSpec, ResultTtl};
    pub use crate::query::Query;
    pub use crate::queue::JobQueue;
    pub use crate::store::{BlockFor, Store};
    pub use crate::worker::{WorkerId, WorkerRegistry};
    pub use crate::{QueueError, QueueResult};
}

//! Queue protocol error types.

use thiserror::Error;

/// Result type for every protocol operation.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors surfaced by the job-queue protocol.
///
/// `DequeueTimeout` is deliberately not one of these: a blocking dequeue
/// that elapses without yielding a job is normal flow control, represented
/// as `Ok(None)` by the dequeue operation rather than an error.
#[derive(Debug, Error)]
pub enum QueueError {
    /// No store connection could be resolved for this call.
    #[error("no store connection available")]
    NoStoreConnection,

    /// The referenced job has no hash in the store.
    #[error("no such job: {0}")]
    NoSuchJob(String),

    /// The requested transition is not valid for the job's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// `Birth` was called for a worker name that is already registered.
    #[error("worker already registered: {0}")]
    DoubleBirth(String),

    /// Serialization error converting job fields to/from the store.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Redis transport error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Redis pool error.
    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}

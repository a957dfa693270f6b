//! Job identifiers and the job hash's field set.

use crate::codec::JobStatus;
use std::collections::HashMap;
use uuid::Uuid;

/// Opaque job identifier. Recommended construction is a fresh v4 UUID, but
/// any non-empty byte string the caller supplies is accepted — the
/// protocol never interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How long a finished job's hash should outlive its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTtl {
    /// Delete the job hash immediately.
    Immediate,
    /// Keep the job hash for this many seconds.
    Seconds(i64),
    /// Keep the job hash forever (no expiry).
    Forever,
}

/// The fields a caller supplies when enqueuing a job.
#[derive(Debug, Clone, Default)]
pub struct JobSpec {
    pub data: Vec<u8>,
    pub description: String,
    pub timeout: Option<i64>,
    pub result_ttl: Option<ResultTtl>,
    pub dependency_id: Option<JobId>,
    /// Extra fields passed through verbatim, never interpreted.
    pub extra: HashMap<String, Vec<u8>>,
}

/// A job's full hash as read back from the store.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub data: Vec<u8>,
    pub description: String,
    pub created_at: String,
    pub origin: Option<String>,
    pub timeout: Option<i64>,
    pub result_ttl: Option<i64>,
    pub enqueued_at: Option<String>,
    pub started_at: Option<String>,
    pub ended_at: Option<String>,
    pub dependency_id: Option<JobId>,
    pub exc_info: Option<Vec<u8>>,
    pub extra: HashMap<String, Vec<u8>>,
}

impl JobRecord {
    /// Parse a raw store hash into a typed record. Returns `None` if the
    /// hash is missing required fields (treated the same as a missing job).
    pub fn from_hash(id: JobId, mut hash: HashMap<String, Vec<u8>>) -> Option<Self> {
        let take_string = |hash: &mut HashMap<String, Vec<u8>>, key: &str| {
            hash.remove(key).map(|v| String::from_utf8_lossy(&v).into_owned())
        };
        let data = hash.remove("data")?;
        let description = take_string(&mut hash, "description").unwrap_or_default();
        let created_at = take_string(&mut hash, "created_at")?;
        let status = take_string(&mut hash, "status").and_then(|s| JobStatus::parse(&s))?;
        let origin = take_string(&mut hash, "origin");
        let timeout = take_string(&mut hash, "timeout").and_then(|s| s.parse().ok());
        let result_ttl = take_string(&mut hash, "result_ttl").and_then(|s| s.parse().ok());
        let enqueued_at = take_string(&mut hash, "enqueued_at");
        let started_at = take_string(&mut hash, "started_at");
        let ended_at = take_string(&mut hash, "ended_at");
        let dependency_id = take_string(&mut hash, "dependency_id").map(JobId::from);
        let exc_info = hash.remove("exc_info");

        Some(Self {
            id,
            status,
            data,
            description,
            created_at,
            origin,
            timeout,
            result_ttl,
            enqueued_at,
            started_at,
            ended_at,
            dependency_id,
            exc_info,
            extra: hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_hash() {
        let mut hash = HashMap::new();
        hash.insert("data".into(), b"payload".to_vec());
        hash.insert("description".into(), b"fixtures.calc(3, 4)".to_vec());
        hash.insert("created_at".into(), b"2016-04-05T22:40:35Z".to_vec());
        hash.insert("status".into(), b"queued".to_vec());
        hash.insert("origin".into(), b"default".to_vec());
        hash.insert("timeout".into(), b"180".to_vec());

        let record = JobRecord::from_hash(JobId::from("abc"), hash).unwrap();
        assert_eq!(record.data, b"payload");
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.origin.as_deref(), Some("default"));
        assert_eq!(record.timeout, Some(180));
    }

    #[test]
    fn missing_required_field_yields_none() {
        let hash = HashMap::new();
        assert!(JobRecord::from_hash(JobId::from("abc"), hash).is_none());
    }
}

//! Key builder for the job-queue schema.
//!
//! Every key the protocol touches is built here, from a configurable
//! prefix plus the logical identifier (queue name, job id, worker name).
//! No other module formats a key by hand.

/// Builds store keys under a configurable prefix (default `rq`).
#[derive(Debug, Clone)]
pub struct Keys {
    prefix: String,
}

/// The distinguished queue name jobs are quarantined to on failure.
pub const FAILED_QUEUE: &str = "failed";

impl Keys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Build a `Keys` from a `StoreConfig`'s `key_prefix`, so the configured
    /// prefix is what every key builder actually uses.
    pub fn from_config(config: &crate::config::StoreConfig) -> Self {
        Self::new(config.key_prefix.clone())
    }

    /// Set of all known queue names.
    pub fn queues(&self) -> String {
        format!("{}:queues", self.prefix)
    }

    /// List of job ids pending on `queue`.
    pub fn queue(&self, queue: &str) -> String {
        format!("{}:queue:{}", self.prefix, queue)
    }

    /// Hash of job fields.
    pub fn job(&self, id: &str) -> String {
        format!("{}:job:{}", self.prefix, id)
    }

    /// Set of job ids waiting on `id` to finish.
    pub fn dependents(&self, id: &str) -> String {
        format!("{}:job:{}:dependents", self.prefix, id)
    }

    /// Sorted set of started (in-progress) job ids for `queue`.
    pub fn wip(&self, queue: &str) -> String {
        format!("{}:wip:{}", self.prefix, queue)
    }

    /// Sorted set of finished job ids for `queue`.
    pub fn finished(&self, queue: &str) -> String {
        format!("{}:finished:{}", self.prefix, queue)
    }

    /// Sorted set of deferred job ids for `queue`.
    pub fn deferred(&self, queue: &str) -> String {
        format!("{}:deferred:{}", self.prefix, queue)
    }

    /// Set of live worker keys.
    pub fn workers(&self) -> String {
        format!("{}:workers", self.prefix)
    }

    /// Hash of worker fields for `name`.
    pub fn worker(&self, name: &str) -> String {
        format!("{}:worker:{}", self.prefix, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_expected_keys() {
        let keys = Keys::new("rq");
        assert_eq!(keys.queues(), "rq:queues");
        assert_eq!(keys.queue("default"), "rq:queue:default");
        assert_eq!(keys.queue(FAILED_QUEUE), "rq:queue:failed");
        assert_eq!(
            keys.job("2a5079e7-387b-492f-a81c-68aa55c194c8"),
            "rq:job:2a5079e7-387b-492f-a81c-68aa55c194c8"
        );
        assert_eq!(keys.dependents("abc"), "rq:job:abc:dependents");
        assert_eq!(keys.wip("default"), "rq:wip:default");
        assert_eq!(keys.finished("default"), "rq:finished:default");
        assert_eq!(keys.deferred("default"), "rq:deferred:default");
        assert_eq!(keys.workers(), "rq:workers");
        assert_eq!(keys.worker("foo"), "rq:worker:foo");
    }

    #[test]
    fn honors_custom_prefix() {
        let keys = Keys::new("myapp");
        assert_eq!(keys.queue("default"), "myapp:queue:default");
    }

    #[test]
    fn from_config_uses_configured_key_prefix() {
        let config = crate::config::StoreConfig {
            key_prefix: "myapp".to_string(),
            ..Default::default()
        };
        let keys = Keys::from_config(&config);
        assert_eq!(keys.queue("default"), "myapp:queue:default");
    }
}

//! Protocol configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the job-queue protocol.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Store connection configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Default TTLs and policy knobs for job/worker lifecycle.
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Connection settings for the backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Key prefix for every key the protocol writes (see `keys::Keys`).
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            pool_size: default_pool_size(),
            connect_timeout_secs: default_connect_timeout(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_key_prefix() -> String {
    "rq".to_string()
}

/// Default TTLs baked into the protocol's lifecycle transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Worker liveness TTL applied by `Birth`/`Heartbeat`, in seconds.
    #[serde(default = "default_worker_ttl")]
    pub worker_ttl_secs: i64,

    /// Residual TTL a worker hash keeps after `Death`, in seconds.
    #[serde(default = "default_death_ttl")]
    pub worker_death_ttl_secs: i64,

    /// Fallback `result_ttl` applied by `Finish` when the job spec omits one.
    #[serde(default = "default_result_ttl")]
    pub default_result_ttl_secs: i64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            worker_ttl_secs: default_worker_ttl(),
            worker_death_ttl_secs: default_death_ttl(),
            default_result_ttl_secs: default_result_ttl(),
        }
    }
}

fn default_worker_ttl() -> i64 {
    420
}

fn default_death_ttl() -> i64 {
    60
}

fn default_result_ttl() -> i64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = QueueConfig::default();
        assert_eq!(cfg.store.key_prefix, "rq");
        assert_eq!(cfg.policy.worker_ttl_secs, 420);
        assert_eq!(cfg.policy.worker_death_ttl_secs, 60);
        assert_eq!(cfg.policy.default_result_ttl_secs, 500);
    }
}

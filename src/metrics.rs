//! Metrics for job queue monitoring.

use metrics::{counter, describe_counter, describe_gauge, gauge};

/// Metric names emitted by the protocol.
pub mod names {
    pub const JOBS_ENQUEUED_TOTAL: &str = "rq_jobs_enqueued_total";
    pub const JOBS_DEQUEUED_TOTAL: &str = "rq_jobs_dequeued_total";
    pub const JOBS_STARTED_TOTAL: &str = "rq_jobs_started_total";
    pub const JOBS_FINISHED_TOTAL: &str = "rq_jobs_finished_total";
    pub const JOBS_FAILED_TOTAL: &str = "rq_jobs_failed_total";
    pub const JOBS_REQUEUED_TOTAL: &str = "rq_jobs_requeued_total";
    pub const JOBS_CANCELLED_TOTAL: &str = "rq_jobs_cancelled_total";
    pub const JOBS_DEFERRED_TOTAL: &str = "rq_jobs_deferred_total";

    pub const WORKERS_ACTIVE: &str = "rq_workers_active";
}

/// Register all metric descriptions. Call once at startup.
pub fn register_metrics() {
    describe_counter!(names::JOBS_ENQUEUED_TOTAL, "Total jobs enqueued");
    describe_counter!(names::JOBS_DEQUEUED_TOTAL, "Total jobs dequeued");
    describe_counter!(names::JOBS_STARTED_TOTAL, "Total jobs started");
    describe_counter!(names::JOBS_FINISHED_TOTAL, "Total jobs finished");
    describe_counter!(names::JOBS_FAILED_TOTAL, "Total jobs failed");
    describe_counter!(names::JOBS_REQUEUED_TOTAL, "Total jobs requeued from failure");
    describe_counter!(names::JOBS_CANCELLED_TOTAL, "Total jobs cancelled");
    describe_counter!(names::JOBS_DEFERRED_TOTAL, "Total jobs deferred on a dependency");
    describe_gauge!(names::WORKERS_ACTIVE, "Currently live workers");
}

pub(crate) fn inc(name: &'static str) {
    counter!(name).increment(1);
}

pub(crate) fn set_gauge(name: &'static str, value: f64) {
    gauge!(name).set(value);
}

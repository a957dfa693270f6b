//! Timestamp formatting and job/worker status enums shared across the
//! protocol. The store only ever sees byte strings; this module is the
//! single place that converts between those and typed Rust values.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Renders `ts` as `YYYY-MM-DDTHH:MM:SSZ`, stripping sub-second precision.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.trunc_subsecs(0).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a timestamp previously produced by [`format_timestamp`].
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Started,
    Finished,
    Failed,
    Deferred,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Started => "started",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
            JobStatus::Deferred => "deferred",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "queued" => Some(JobStatus::Queued),
            "started" => Some(JobStatus::Started),
            "finished" => Some(JobStatus::Finished),
            "failed" => Some(JobStatus::Failed),
            "deferred" => Some(JobStatus::Deferred),
            _ => None,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerStatus {
    Started,
    Busy,
    Idle,
    Suspended,
}

impl WorkerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerStatus::Started => "started",
            WorkerStatus::Busy => "busy",
            WorkerStatus::Idle => "idle",
            WorkerStatus::Suspended => "suspended",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "started" => Some(WorkerStatus::Started),
            "busy" => Some(WorkerStatus::Busy),
            "idle" => Some(WorkerStatus::Idle),
            "suspended" => Some(WorkerStatus::Suspended),
            _ => None,
        }
    }
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_without_subsecond_precision() {
        let ts = Utc.with_ymd_and_hms(2016, 4, 5, 22, 40, 35).unwrap();
        assert_eq!(format_timestamp(ts), "2016-04-05T22:40:35Z");
    }

    #[test]
    fn round_trips_through_parse() {
        let ts = Utc.with_ymd_and_hms(2016, 4, 5, 22, 40, 35).unwrap();
        let formatted = format_timestamp(ts);
        assert_eq!(parse_timestamp(&formatted), Some(ts));
    }

    #[test]
    fn job_status_round_trips() {
        for status in [
            JobStatus::Queued,
            JobStatus::Started,
            JobStatus::Finished,
            JobStatus::Failed,
            JobStatus::Deferred,
        ] {
            assert_eq!(JobStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(JobStatus::parse("bogus"), None);
    }
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Identity and provenance of one pipeline run, written to the run ledger on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: Uuid,
    pub started_at: i64,
    pub tool_version: String,
    pub feed_url: String,
}

impl RunMeta {
    pub fn new(tool_version: &str, feed_url: &str) -> Self {
        RunMeta {
            run_id: Uuid::now_v7(),
            started_at: now_ms(),
            tool_version: tool_version.to_string(),
            feed_url: feed_url.to_string(),
        }
    }
}

/// What a full refresh wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub run_id: Uuid,
    pub threat_rows: usize,
    pub server_rows: usize,
}

/// A row of the `etl_runs` ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub tool_version: String,
    pub feed_url: String,
    pub threat_count: i64,
    pub server_count: i64,
}

pub(crate) fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

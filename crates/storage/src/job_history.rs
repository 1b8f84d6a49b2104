//! `job_history` table (spec §6): `(job_type PRIMARY KEY, last_run_at,
//! last_status)`, upsert semantics. Consulted by the scheduler's
//! `ShouldRun` and written by the processor on every completed execution.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StoreError;
use crate::snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum JobStatus {
    Success,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct JobHistoryRecord {
    pub job_type: String,
    pub last_run_at: u64,
    pub last_status: JobStatus,
}

/// Synchronous — a `HashMap` entry API only locks the whole map for the
/// duration of one upsert, so concurrent writes to different job types
/// never contend across an `.await` point (spec §5: "concurrent writes to
/// different types are independent").
pub trait JobHistoryStore: Send + Sync {
    fn get(&self, job_type: &str) -> Option<JobHistoryRecord>;

    fn record_execution(&self, job_type: &str, now_epoch: u64, status: JobStatus) -> Result<(), StoreError>;

    /// `true` if no history, or if `last_run_at + interval_secs <= now`
    /// (spec §4.8). Missing-history is a safe default, never an error.
    fn should_run(&self, job_type: &str, interval_secs: u64, now_epoch: u64) -> bool {
        match self.get(job_type) {
            None => true,
            Some(record) => record.last_run_at.saturating_add(interval_secs) <= now_epoch,
        }
    }
}

/// Pure in-memory store; nothing is persisted across process restarts.
#[derive(Clone, Default)]
pub struct InMemoryJobHistoryStore {
    rows: Arc<Mutex<HashMap<String, JobHistoryRecord>>>,
}

impl JobHistoryStore for InMemoryJobHistoryStore {
    fn get(&self, job_type: &str) -> Option<JobHistoryRecord> {
        self.rows.lock().get(job_type).cloned()
    }

    fn record_execution(&self, job_type: &str, now_epoch: u64, status: JobStatus) -> Result<(), StoreError> {
        self.rows.lock().insert(
            job_type.to_string(),
            JobHistoryRecord { job_type: job_type.to_string(), last_run_at: now_epoch, last_status: status },
        );
        Ok(())
    }
}

/// File-backed store: loads a zstd-compressed JSON snapshot at
/// construction, flushes the whole table on every upsert. Fine for a table
/// this small (one row per `WorkType`, not per execution).
#[derive(Clone)]
pub struct FileJobHistoryStore {
    path: PathBuf,
    rows: Arc<Mutex<HashMap<String, JobHistoryRecord>>>,
}

impl FileJobHistoryStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let rows: HashMap<String, JobHistoryRecord> = snapshot::load(&path)?;
        Ok(Self { path, rows: Arc::new(Mutex::new(rows)) })
    }

    fn flush(&self) -> Result<(), StoreError> {
        snapshot::save(&self.path, &*self.rows.lock())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JobHistoryStore for FileJobHistoryStore {
    fn get(&self, job_type: &str) -> Option<JobHistoryRecord> {
        self.rows.lock().get(job_type).cloned()
    }

    fn record_execution(&self, job_type: &str, now_epoch: u64, status: JobStatus) -> Result<(), StoreError> {
        self.rows.lock().insert(
            job_type.to_string(),
            JobHistoryRecord { job_type: job_type.to_string(), last_run_at: now_epoch, last_status: status },
        );
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_run_true_with_no_history() {
        let store = InMemoryJobHistoryStore::default();
        assert!(store.should_run("planner:weights", 60, 1_000));
    }

    #[test]
    fn should_run_false_before_interval_elapses() {
        let store = InMemoryJobHistoryStore::default();
        store.record_execution("planner:weights", 1_000, JobStatus::Success).unwrap();
        assert!(!store.should_run("planner:weights", 60, 1_010));
        assert!(store.should_run("planner:weights", 60, 1_060));
    }

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_history.bin");
        {
            let store = FileJobHistoryStore::open(&path).unwrap();
            store.record_execution("security:sync", 500, JobStatus::Success).unwrap();
        }
        let reopened = FileJobHistoryStore::open(&path).unwrap();
        let record = reopened.get("security:sync").unwrap();
        assert_eq!(record.last_run_at, 500);
        assert_eq!(record.last_status, JobStatus::Success);
    }
}

//! In-memory tracker for mass moderation jobs. Process-local only; the UI
//! polls snapshots for sub-second progress. Not authoritative — restart
//! loses every job.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;

const MAX_LOG_LINES: usize = 200;

/// By-value snapshot of one bulk job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkJob {
    pub id: u64,
    pub action: String,
    pub scope: String,
    pub kind: String,
    pub total: u64,
    pub processed: u64,
    pub done: bool,
    pub error: Option<String>,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub log: Vec<String>,
}

struct JobState {
    action: String,
    scope: String,
    kind: String,
    total: u64,
    processed: u64,
    done: bool,
    error: Option<String>,
    started_at: i64,
    finished_at: Option<i64>,
    log: VecDeque<String>,
}

#[derive(Clone, Default)]
pub struct BulkJobStore {
    jobs: Arc<RwLock<HashMap<u64, JobState>>>,
    next_id: Arc<AtomicU64>,
}

impl BulkJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_job(&self, action: &str, scope: &str, kind: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let state = JobState {
            action: action.to_string(),
            scope: scope.to_string(),
            kind: kind.to_string(),
            total: 0,
            processed: 0,
            done: false,
            error: None,
            started_at: Utc::now().timestamp(),
            finished_at: None,
            log: VecDeque::new(),
        };
        self.jobs.write().expect("bulk job lock poisoned").insert(id, state);
        id
    }

    pub fn set_total(&self, id: u64, total: u64) {
        let mut jobs = self.jobs.write().expect("bulk job lock poisoned");
        if let Some(job) = jobs.get_mut(&id) {
            if !job.done {
                job.total = total;
            }
        }
    }

    /// Progress is monotonic; a lower value than already recorded is kept.
    pub fn set_processed(&self, id: u64, processed: u64) {
        let mut jobs = self.jobs.write().expect("bulk job lock poisoned");
        if let Some(job) = jobs.get_mut(&id) {
            if !job.done {
                job.processed = job.processed.max(processed);
            }
        }
    }

    /// Append a log line, keeping only the most recent entries.
    pub fn add_log(&self, id: u64, line: impl Into<String>) {
        let mut jobs = self.jobs.write().expect("bulk job lock poisoned");
        if let Some(job) = jobs.get_mut(&id) {
            job.log.push_back(line.into());
            while job.log.len() > MAX_LOG_LINES {
                job.log.pop_front();
            }
        }
    }

    pub fn finish(&self, id: u64, error: Option<String>) {
        let mut jobs = self.jobs.write().expect("bulk job lock poisoned");
        if let Some(job) = jobs.get_mut(&id) {
            if !job.done {
                job.done = true;
                job.error = error;
                job.finished_at = Some(Utc::now().timestamp());
            }
        }
    }

    pub fn snapshot(&self, id: u64) -> Option<BulkJob> {
        let jobs = self.jobs.read().expect("bulk job lock poisoned");
        jobs.get(&id).map(|job| BulkJob {
            id,
            action: job.action.clone(),
            scope: job.scope.clone(),
            kind: job.kind.clone(),
            total: job.total,
            processed: job.processed,
            done: job.done,
            error: job.error.clone(),
            started_at: job.started_at,
            finished_at: job.finished_at,
            log: job.log.iter().cloned().collect(),
        })
    }
}

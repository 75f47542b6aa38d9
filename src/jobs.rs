//! Durable admin job registry. The database row is the source of truth a
//! UI can poll across processes; an in-memory bulk job mirrors it when
//! sub-second granularity is wanted.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, QuerySelect,
    Set,
};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::entities::{self, admin_job};
use crate::errors::LlinatgeError;

pub const KIND_NIVELLS_REBUILD: &str = "nivells_rebuild";
pub const KIND_ADMIN_IMPORT: &str = "admin_import";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "done" => Some(JobStatus::Done),
            "error" => Some(JobStatus::Error),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

#[derive(Clone)]
pub struct JobRegistry {
    db: DatabaseConnection,
    /// Kinds with a registered retry handler. Retrying any other kind is
    /// rejected.
    retryable: Arc<HashSet<&'static str>>,
    /// Serializes read-modify-write progress updates so readers observe a
    /// monotonic sequence.
    progress_lock: Arc<Mutex<()>>,
}

impl JobRegistry {
    pub fn new(db: DatabaseConnection) -> Self {
        let mut retryable = HashSet::new();
        retryable.insert(KIND_NIVELLS_REBUILD);
        Self {
            db,
            retryable: Arc::new(retryable),
            progress_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create a job in `running` state with fresh timestamps.
    pub async fn create(
        &self,
        kind: &str,
        payload: &Value,
        created_by: Option<i64>,
    ) -> Result<i64, LlinatgeError> {
        let now = Utc::now().timestamp();
        let row = admin_job::ActiveModel {
            kind: Set(kind.to_string()),
            status: Set(JobStatus::Running.as_str().to_string()),
            progress_done: Set(0),
            progress_total: Set(0),
            payload_json: Set(Some(serde_json::to_string(payload)?)),
            started_at: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
            created_by: Set(created_by),
            ..Default::default()
        };
        let inserted = row.insert(&self.db).await?;
        tracing::info!(job_id = inserted.id, kind, "Created admin job");
        Ok(inserted.id)
    }

    pub async fn get(&self, id: i64) -> Result<Option<admin_job::Model>, LlinatgeError> {
        let row = entities::AdminJob::find_by_id(id).one(&self.db).await?;
        Ok(row)
    }

    pub async fn recent(&self, limit: u64) -> Result<Vec<admin_job::Model>, LlinatgeError> {
        let rows = entities::AdminJob::find()
            .order_by_desc(admin_job::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Record progress. `done` never regresses; terminal jobs are frozen.
    pub async fn update_progress(
        &self,
        id: i64,
        done: i64,
        total: i64,
    ) -> Result<(), LlinatgeError> {
        let _guard = self.progress_lock.lock().await;

        let Some(job) = self.get(id).await? else {
            return Err(LlinatgeError::NotFound(format!("admin job {id}")));
        };
        if JobStatus::parse(&job.status).is_some_and(|s| s.is_terminal()) {
            return Ok(());
        }

        let done = done.max(job.progress_done);
        let done = if total > 0 { done.min(total) } else { done };

        let mut active = job.into_active_model();
        active.progress_done = Set(done);
        active.progress_total = Set(total);
        active.updated_at = Set(Utc::now().timestamp());
        active.update(&self.db).await?;
        Ok(())
    }

    /// Transition a job into a terminal state. An error text forces status
    /// `error` regardless of `status`. Already-terminal jobs stay frozen.
    pub async fn finish(
        &self,
        id: i64,
        status: JobStatus,
        error: Option<String>,
        result: Option<Value>,
    ) -> Result<(), LlinatgeError> {
        let _guard = self.progress_lock.lock().await;

        let Some(job) = self.get(id).await? else {
            return Err(LlinatgeError::NotFound(format!("admin job {id}")));
        };
        if JobStatus::parse(&job.status).is_some_and(|s| s.is_terminal()) {
            return Ok(());
        }

        let status = if error.is_some() {
            JobStatus::Error
        } else {
            status
        };
        let now = Utc::now().timestamp();

        let mut active = job.into_active_model();
        active.status = Set(status.as_str().to_string());
        active.error_text = Set(error);
        active.result_json = Set(match result {
            Some(v) => Some(serde_json::to_string(&v)?),
            None => None,
        });
        active.finished_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(&self.db).await?;

        tracing::info!(job_id = id, status = status.as_str(), "Finished admin job");
        Ok(())
    }

    /// Spawn a fresh job with the same payload as a failed one. Only
    /// permitted from `error`, and only for kinds with a retry handler.
    /// The failed job itself is left untouched.
    pub async fn retry(&self, id: i64) -> Result<i64, LlinatgeError> {
        let Some(job) = self.get(id).await? else {
            return Err(LlinatgeError::NotFound(format!("admin job {id}")));
        };
        if JobStatus::parse(&job.status) != Some(JobStatus::Error) {
            return Err(LlinatgeError::BadRequest(format!(
                "job {id} is {}, only error jobs can be retried",
                job.status
            )));
        }
        if !self.retryable.contains(job.kind.as_str()) {
            return Err(LlinatgeError::BadRequest(format!(
                "job kind {} has no retry handler",
                job.kind
            )));
        }

        let payload: Value = match &job.payload_json {
            Some(raw) => serde_json::from_str(raw)?,
            None => Value::Null,
        };
        let new_id = self.create(&job.kind, &payload, job.created_by).await?;
        tracing::info!(job_id = id, new_job_id = new_id, "Retrying admin job");
        Ok(new_id)
    }
}

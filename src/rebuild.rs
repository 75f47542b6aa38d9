//! Territorial rebuild orchestrator: one global closure rebuild followed by
//! per-level statistics and demographics recomputes, reporting progress to
//! both the durable job and the in-memory tracker.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::app::App;
use crate::closure;
use crate::entities::{self, arxiu, llibre, nivell_demografia, nivell_estadistica, persona};
use crate::errors::LlinatgeError;
use crate::jobs::{JobStatus, KIND_NIVELLS_REBUILD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildKind {
    Demografia,
    Stats,
    All,
}

impl RebuildKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebuildKind::Demografia => "demografia",
            RebuildKind::Stats => "stats",
            RebuildKind::All => "all",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "demografia" => Some(RebuildKind::Demografia),
            "stats" => Some(RebuildKind::Stats),
            "all" => Some(RebuildKind::All),
            _ => None,
        }
    }

    /// Units of work per target level.
    fn units(&self) -> u64 {
        match self {
            RebuildKind::All => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NivellsRebuildPayload {
    pub kind: String,
    pub nivell_id: i64,
    pub all: bool,
}

/// Create the durable job plus its in-memory mirror and run the rebuild in
/// a detached task. Returns both handles for polling.
pub async fn launch(
    app: &App,
    payload: NivellsRebuildPayload,
    created_by: Option<i64>,
) -> Result<(i64, u64), LlinatgeError> {
    let job_id = app
        .jobs
        .create(KIND_NIVELLS_REBUILD, &serde_json::to_value(&payload)?, created_by)
        .await?;
    let bulk_id = app
        .bulk_jobs
        .new_job("rebuild", "nivells", &payload.kind);

    let task_app = app.clone();
    tokio::spawn(async move {
        run(task_app, job_id, bulk_id, payload).await;
    });

    Ok((job_id, bulk_id))
}

/// Execute the rebuild and settle both job records. Never panics; failures
/// land in the durable job's error text.
pub async fn run(app: App, job_id: i64, bulk_id: u64, payload: NivellsRebuildPayload) {
    match execute(&app, job_id, bulk_id, &payload).await {
        Ok(processed) => {
            let result = json!({"processed": processed, "kind": payload.kind});
            if let Err(e) = app
                .jobs
                .finish(job_id, JobStatus::Done, None, Some(result))
                .await
            {
                tracing::error!(job_id, error = %e, "Failed to finish rebuild job");
            }
            app.bulk_jobs.finish(bulk_id, None);
        }
        Err(e) => {
            tracing::error!(job_id, error = %e, "Nivells rebuild failed");
            if let Err(finish_err) = app
                .jobs
                .finish(job_id, JobStatus::Error, Some(e.to_string()), None)
                .await
            {
                tracing::error!(job_id, error = %finish_err, "Failed to record rebuild error");
            }
            app.bulk_jobs.finish(bulk_id, Some(e.to_string()));
        }
    }
}

async fn execute(
    app: &App,
    job_id: i64,
    bulk_id: u64,
    payload: &NivellsRebuildPayload,
) -> Result<u64, LlinatgeError> {
    let kind = RebuildKind::parse(&payload.kind).ok_or_else(|| {
        LlinatgeError::BadRequest(format!("unknown rebuild kind {}", payload.kind))
    })?;

    let targets = if payload.all {
        crate::storage::all_nivell_ids(&app.db).await?
    } else {
        if payload.nivell_id <= 0 {
            return Err(LlinatgeError::BadRequest(
                "nivell_id must be positive unless all is set".into(),
            ));
        }
        vec![payload.nivell_id]
    };

    let total = targets.len() as u64 * kind.units();
    app.bulk_jobs.set_total(bulk_id, total);
    app.jobs.update_progress(job_id, 0, total as i64).await?;

    // One global closure pass is cheaper than one per target level.
    let summary = closure::rebuild_all(&app.db).await?;
    app.bulk_jobs.add_log(
        bulk_id,
        format!(
            "closure rebuilt: {} processed, {} failed",
            summary.processed, summary.failed
        ),
    );

    let mut processed: u64 = 0;
    for nivell_id in targets {
        if matches!(kind, RebuildKind::Stats | RebuildKind::All) {
            recompute_estadistiques(&app.db, nivell_id).await?;
            processed += 1;
            app.bulk_jobs.set_processed(bulk_id, processed);
            app.jobs
                .update_progress(job_id, processed as i64, total as i64)
                .await?;
        }
        if matches!(kind, RebuildKind::Demografia | RebuildKind::All) {
            recompute_demografia(&app.db, nivell_id).await?;
            processed += 1;
            app.bulk_jobs.set_processed(bulk_id, processed);
            app.jobs
                .update_progress(job_id, processed as i64, total as i64)
                .await?;
        }
        app.bulk_jobs
            .add_log(bulk_id, format!("nivell {nivell_id} recomputed"));
    }

    Ok(processed)
}

/// Recount municipalities, archives and books under one level.
pub async fn recompute_estadistiques(
    db: &DatabaseConnection,
    nivell_id: i64,
) -> Result<(), LlinatgeError> {
    let municipis = crate::storage::municipi_ids_for_nivell(db, nivell_id).await?;

    let (arxius, llibres) = if municipis.is_empty() {
        (0, 0)
    } else {
        let arxius = entities::Arxiu::find()
            .filter(arxiu::Column::MunicipiId.is_in(municipis.clone()))
            .count(db)
            .await?;
        let llibres = entities::Llibre::find()
            .filter(llibre::Column::MunicipiId.is_in(municipis.clone()))
            .count(db)
            .await?;
        (arxius, llibres)
    };

    let now = Utc::now().timestamp();
    let existing = entities::NivellEstadistica::find_by_id(nivell_id).one(db).await?;
    match existing {
        Some(row) => {
            let mut active = row.into_active_model();
            active.municipis = Set(municipis.len() as i64);
            active.arxius = Set(arxius as i64);
            active.llibres = Set(llibres as i64);
            active.updated_at = Set(now);
            active.update(db).await?;
        }
        None => {
            nivell_estadistica::ActiveModel {
                nivell_id: Set(nivell_id),
                municipis: Set(municipis.len() as i64),
                arxius: Set(arxius as i64),
                llibres: Set(llibres as i64),
                updated_at: Set(now),
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

/// Recount persons and distinct surnames under one level.
pub async fn recompute_demografia(
    db: &DatabaseConnection,
    nivell_id: i64,
) -> Result<(), LlinatgeError> {
    let municipis = crate::storage::municipi_ids_for_nivell(db, nivell_id).await?;

    let (persones, cognoms) = if municipis.is_empty() {
        (0, 0)
    } else {
        let persones = entities::Persona::find()
            .filter(persona::Column::MunicipiId.is_in(municipis.clone()))
            .count(db)
            .await?;
        let cognoms: Vec<Option<String>> = entities::Persona::find()
            .select_only()
            .column(persona::Column::Cognom1)
            .distinct()
            .filter(persona::Column::MunicipiId.is_in(municipis.clone()))
            .into_tuple()
            .all(db)
            .await?;
        let cognoms = cognoms.into_iter().flatten().count() as u64;
        (persones, cognoms)
    };

    let now = Utc::now().timestamp();
    let existing = entities::NivellDemografia::find_by_id(nivell_id).one(db).await?;
    match existing {
        Some(row) => {
            let mut active = row.into_active_model();
            active.persones = Set(persones as i64);
            active.cognoms = Set(cognoms as i64);
            active.updated_at = Set(now);
            active.update(db).await?;
        }
        None => {
            nivell_demografia::ActiveModel {
                nivell_id: Set(nivell_id),
                persones: Set(persones as i64),
                cognoms: Set(cognoms as i64),
                updated_at: Set(now),
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Durable long-running job record. Status automaton:
/// queued -> running -> (done | error). Once terminal, the row is frozen.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub kind: String,
    pub status: String,
    pub progress_done: i64,
    pub progress_total: i64,
    pub payload_json: Option<String>,
    pub result_json: Option<String>,
    pub error_text: Option<String>,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

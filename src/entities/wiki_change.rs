use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A moderated mutation proposal. `metadata` carries the before/after JSON
/// snapshots; `moderacio_estat` is one of "pendent", "publicat", "rebutjat".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wiki_changes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub object_type: String,
    pub object_id: i64,
    pub changed_by: i64,
    pub moderacio_estat: String,
    pub metadata: String,
    pub created_at: i64,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<i64>,
    pub moderacio_motiu: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

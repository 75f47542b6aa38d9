use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One administrative level (region, province, comarca). `pais_id` points at
/// the owning country; `parent_id` at the enclosing level, when any.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nivells_administratius")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub nom: String,
    pub tipus: String,
    pub pais_id: i64,
    pub parent_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

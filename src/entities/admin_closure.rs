use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Materialized ancestor relation. `ancestor_type` is one of "municipi",
/// "nivell", "pais".
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_closure")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub descendant_municipi_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ancestor_type: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub ancestor_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "persones")]
#[serde(rename_all = "PascalCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub nom: String,
    pub cognom1: Option<String>,
    pub cognom2: Option<String>,
    pub municipi_id: Option<i64>,
    pub moderacio_estat: String,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<i64>,
    pub moderacio_motiu: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

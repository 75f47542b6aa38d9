use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "nivells_estadistiques")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub nivell_id: i64,
    pub municipis: i64,
    pub arxius: i64,
    pub llibres: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

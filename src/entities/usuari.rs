use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `permissions_version` is bumped whenever a binding, policy or grant
/// touching this user changes; the permission cache keys on it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "usuaris")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub nom: String,
    pub email: Option<String>,
    pub permissions_version: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

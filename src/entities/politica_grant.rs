use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One structured grant. `scope_id` is null exactly when `scope_type` is
/// "global"; `include_children` extends the grant to descendant scope kinds.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "politiques_grants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub politica_id: i64,
    pub perm_key: String,
    pub scope_type: String,
    pub scope_id: Option<i64>,
    pub include_children: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::politica::Entity",
        from = "Column::PoliticaId",
        to = "super::politica::Column::Id"
    )]
    Politica,
}

impl Related<super::politica::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Politica.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

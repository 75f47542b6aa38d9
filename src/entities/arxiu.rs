use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "arxius")]
#[serde(rename_all = "PascalCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub nom: String,
    pub municipi_id: i64,
    pub entitat_id: Option<i64>,
    pub moderacio_estat: String,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<i64>,
    pub moderacio_motiu: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::municipi::Entity",
        from = "Column::MunicipiId",
        to = "super::municipi::Column::Id"
    )]
    Municipi,
}

impl Related<super::municipi::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Municipi.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

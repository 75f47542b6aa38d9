use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A municipality and its ordered administrative level chain
/// (regio, provincia, comarca). Serialized field names are the wiki
/// snapshot wire format.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "municipis")]
#[serde(rename_all = "PascalCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub nom: String,
    pub pais_id: Option<i64>,
    pub regio_id: Option<i64>,
    pub provincia_id: Option<i64>,
    pub comarca_id: Option<i64>,
    pub moderacio_estat: String,
    pub moderated_by: Option<i64>,
    pub moderated_at: Option<i64>,
    pub moderacio_motiu: Option<String>,
}

impl Model {
    /// Ordered level chain, most generic first, nulls and non-positive ids
    /// dropped.
    pub fn nivell_chain(&self) -> Vec<i64> {
        [self.regio_id, self.provincia_id, self.comarca_id]
            .into_iter()
            .flatten()
            .filter(|id| *id > 0)
            .collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "arxius_llibres")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub arxiu_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub llibre_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::arxiu::Entity",
        from = "Column::ArxiuId",
        to = "super::arxiu::Column::Id"
    )]
    Arxiu,
    #[sea_orm(
        belongs_to = "super::llibre::Entity",
        from = "Column::LlibreId",
        to = "super::llibre::Column::Id"
    )]
    Llibre,
}

impl Related<super::arxiu::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Arxiu.def()
    }
}

impl Related<super::llibre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Llibre.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

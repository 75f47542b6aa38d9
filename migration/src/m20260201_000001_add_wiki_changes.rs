use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create wiki_changes table with backend-specific ID type
        let id_col = match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => ColumnDef::new(WikiChanges::Id)
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key()
                .to_owned(),
            _ => ColumnDef::new(WikiChanges::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key()
                .to_owned(),
        };

        manager
            .create_table(
                Table::create()
                    .table(WikiChanges::Table)
                    .if_not_exists()
                    .col(id_col)
                    .col(string(WikiChanges::ObjectType))
                    .col(big_integer(WikiChanges::ObjectId))
                    .col(big_integer(WikiChanges::ChangedBy))
                    .col(string(WikiChanges::ModeracioEstat))
                    .col(text(WikiChanges::Metadata))
                    .col(big_integer(WikiChanges::CreatedAt))
                    .col(big_integer_null(WikiChanges::ModeratedBy))
                    .col(big_integer_null(WikiChanges::ModeratedAt))
                    .col(string_null(WikiChanges::ModeracioMotiu))
                    .to_owned(),
            )
            .await?;

        // Create index on wiki_changes object for history views
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_wiki_changes_object")
                    .table(WikiChanges::Table)
                    .col(WikiChanges::ObjectType)
                    .col(WikiChanges::ObjectId)
                    .to_owned(),
            )
            .await?;

        // Create index on wiki_changes.moderacio_estat for the pending queue
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_wiki_changes_estat")
                    .table(WikiChanges::Table)
                    .col(WikiChanges::ModeracioEstat)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WikiChanges::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum WikiChanges {
    Table,
    Id,
    ObjectType,
    ObjectId,
    ChangedBy,
    ModeracioEstat,
    Metadata,
    CreatedAt,
    ModeratedBy,
    ModeratedAt,
    ModeracioMotiu,
}

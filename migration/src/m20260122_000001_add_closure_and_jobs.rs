use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create admin_closure table. One row per (municipality, ancestor);
        // the triple itself is the identity.
        manager
            .create_table(
                Table::create()
                    .table(AdminClosure::Table)
                    .if_not_exists()
                    .col(big_integer(AdminClosure::DescendantMunicipiId))
                    .col(string(AdminClosure::AncestorType))
                    .col(big_integer(AdminClosure::AncestorId))
                    .primary_key(
                        Index::create()
                            .col(AdminClosure::DescendantMunicipiId)
                            .col(AdminClosure::AncestorType)
                            .col(AdminClosure::AncestorId),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index for ancestor-side lookups (list-scope filtering)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_admin_closure_ancestor")
                    .table(AdminClosure::Table)
                    .col(AdminClosure::AncestorType)
                    .col(AdminClosure::AncestorId)
                    .to_owned(),
            )
            .await?;

        // Create admin_jobs table with backend-specific ID type
        let id_col = match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => ColumnDef::new(AdminJobs::Id)
                .big_integer()
                .not_null()
                .auto_increment()
                .primary_key()
                .to_owned(),
            _ => ColumnDef::new(AdminJobs::Id)
                .integer()
                .not_null()
                .auto_increment()
                .primary_key()
                .to_owned(),
        };

        manager
            .create_table(
                Table::create()
                    .table(AdminJobs::Table)
                    .if_not_exists()
                    .col(id_col)
                    .col(string(AdminJobs::Kind))
                    .col(string(AdminJobs::Status))
                    .col(
                        ColumnDef::new(AdminJobs::ProgressDone)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdminJobs::ProgressTotal)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(text_null(AdminJobs::PayloadJson))
                    .col(text_null(AdminJobs::ResultJson))
                    .col(text_null(AdminJobs::ErrorText))
                    .col(big_integer_null(AdminJobs::StartedAt))
                    .col(big_integer_null(AdminJobs::FinishedAt))
                    .col(big_integer(AdminJobs::CreatedAt))
                    .col(big_integer(AdminJobs::UpdatedAt))
                    .col(big_integer_null(AdminJobs::CreatedBy))
                    .to_owned(),
            )
            .await?;

        // Create index on admin_jobs.created_at for recent-jobs listing
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_admin_jobs_created")
                    .table(AdminJobs::Table)
                    .col(AdminJobs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Create nivells_estadistiques table
        manager
            .create_table(
                Table::create()
                    .table(NivellsEstadistiques::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NivellsEstadistiques::NivellId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(big_integer(NivellsEstadistiques::Municipis))
                    .col(big_integer(NivellsEstadistiques::Arxius))
                    .col(big_integer(NivellsEstadistiques::Llibres))
                    .col(big_integer(NivellsEstadistiques::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create nivells_demografia table
        manager
            .create_table(
                Table::create()
                    .table(NivellsDemografia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NivellsDemografia::NivellId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(big_integer(NivellsDemografia::Persones))
                    .col(big_integer(NivellsDemografia::Cognoms))
                    .col(big_integer(NivellsDemografia::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NivellsDemografia::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(NivellsEstadistiques::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminClosure::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum AdminClosure {
    Table,
    DescendantMunicipiId,
    AncestorType,
    AncestorId,
}

#[derive(DeriveIden)]
enum AdminJobs {
    Table,
    Id,
    Kind,
    Status,
    ProgressDone,
    ProgressTotal,
    PayloadJson,
    ResultJson,
    ErrorText,
    StartedAt,
    FinishedAt,
    CreatedAt,
    UpdatedAt,
    CreatedBy,
}

#[derive(DeriveIden)]
enum NivellsEstadistiques {
    Table,
    NivellId,
    Municipis,
    Arxius,
    Llibres,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum NivellsDemografia {
    Table,
    NivellId,
    Persones,
    Cognoms,
    UpdatedAt,
}

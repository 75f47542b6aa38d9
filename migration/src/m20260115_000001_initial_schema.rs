use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Auto-increment big id with backend-specific column type (SQLite wants
/// plain INTEGER for rowid aliasing).
fn auto_id<T: IntoIden + 'static>(manager: &SchemaManager, col: T) -> ColumnDef {
    match manager.get_database_backend() {
        sea_orm::DatabaseBackend::Postgres => ColumnDef::new(col)
            .big_integer()
            .not_null()
            .auto_increment()
            .primary_key()
            .to_owned(),
        _ => ColumnDef::new(col)
            .integer()
            .not_null()
            .auto_increment()
            .primary_key()
            .to_owned(),
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Enable foreign keys for SQLite
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Sqlite {
            manager
                .get_connection()
                .execute_unprepared("PRAGMA foreign_keys = ON")
                .await?;
        }

        // Create paisos table
        manager
            .create_table(
                Table::create()
                    .table(Paisos::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Paisos::Id))
                    .col(string(Paisos::Nom))
                    .col(string_null(Paisos::Codi))
                    .to_owned(),
            )
            .await?;

        // Create nivells_administratius table
        manager
            .create_table(
                Table::create()
                    .table(NivellsAdministratius::Table)
                    .if_not_exists()
                    .col(auto_id(manager, NivellsAdministratius::Id))
                    .col(string(NivellsAdministratius::Nom))
                    .col(string(NivellsAdministratius::Tipus))
                    .col(big_integer(NivellsAdministratius::PaisId))
                    .col(big_integer_null(NivellsAdministratius::ParentId))
                    .to_owned(),
            )
            .await?;

        // Create municipis table
        manager
            .create_table(
                Table::create()
                    .table(Municipis::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Municipis::Id))
                    .col(string(Municipis::Nom))
                    .col(big_integer_null(Municipis::PaisId))
                    .col(big_integer_null(Municipis::RegioId))
                    .col(big_integer_null(Municipis::ProvinciaId))
                    .col(big_integer_null(Municipis::ComarcaId))
                    .col(
                        ColumnDef::new(Municipis::ModeracioEstat)
                            .string()
                            .not_null()
                            .default("publicat"),
                    )
                    .col(big_integer_null(Municipis::ModeratedBy))
                    .col(big_integer_null(Municipis::ModeratedAt))
                    .col(string_null(Municipis::ModeracioMotiu))
                    .to_owned(),
            )
            .await?;

        // Create entitats_eclesiastiques table
        manager
            .create_table(
                Table::create()
                    .table(EntitatsEclesiastiques::Table)
                    .if_not_exists()
                    .col(auto_id(manager, EntitatsEclesiastiques::Id))
                    .col(string(EntitatsEclesiastiques::Nom))
                    .col(big_integer_null(EntitatsEclesiastiques::MunicipiId))
                    .to_owned(),
            )
            .await?;

        // Create arxius table
        manager
            .create_table(
                Table::create()
                    .table(Arxius::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Arxius::Id))
                    .col(string(Arxius::Nom))
                    .col(big_integer(Arxius::MunicipiId))
                    .col(big_integer_null(Arxius::EntitatId))
                    .col(
                        ColumnDef::new(Arxius::ModeracioEstat)
                            .string()
                            .not_null()
                            .default("publicat"),
                    )
                    .col(big_integer_null(Arxius::ModeratedBy))
                    .col(big_integer_null(Arxius::ModeratedAt))
                    .col(string_null(Arxius::ModeracioMotiu))
                    .to_owned(),
            )
            .await?;

        // Create llibres table
        manager
            .create_table(
                Table::create()
                    .table(Llibres::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Llibres::Id))
                    .col(string(Llibres::Titol))
                    .col(big_integer(Llibres::MunicipiId))
                    .col(big_integer_null(Llibres::EntitatId))
                    .col(string_null(Llibres::Anys))
                    .col(
                        ColumnDef::new(Llibres::ModeracioEstat)
                            .string()
                            .not_null()
                            .default("publicat"),
                    )
                    .col(big_integer_null(Llibres::ModeratedBy))
                    .col(big_integer_null(Llibres::ModeratedAt))
                    .col(string_null(Llibres::ModeracioMotiu))
                    .to_owned(),
            )
            .await?;

        // Create arxius_llibres bridge table
        manager
            .create_table(
                Table::create()
                    .table(ArxiusLlibres::Table)
                    .if_not_exists()
                    .col(big_integer(ArxiusLlibres::ArxiuId))
                    .col(big_integer(ArxiusLlibres::LlibreId))
                    .primary_key(
                        Index::create()
                            .col(ArxiusLlibres::ArxiuId)
                            .col(ArxiusLlibres::LlibreId),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on arxius_llibres.llibre_id for re-link lookups
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_arxius_llibres_llibre")
                    .table(ArxiusLlibres::Table)
                    .col(ArxiusLlibres::LlibreId)
                    .to_owned(),
            )
            .await?;

        // Create persones table
        manager
            .create_table(
                Table::create()
                    .table(Persones::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Persones::Id))
                    .col(string(Persones::Nom))
                    .col(string_null(Persones::Cognom1))
                    .col(string_null(Persones::Cognom2))
                    .col(big_integer_null(Persones::MunicipiId))
                    .col(
                        ColumnDef::new(Persones::ModeracioEstat)
                            .string()
                            .not_null()
                            .default("publicat"),
                    )
                    .col(big_integer_null(Persones::ModeratedBy))
                    .col(big_integer_null(Persones::ModeratedAt))
                    .col(string_null(Persones::ModeracioMotiu))
                    .to_owned(),
            )
            .await?;

        // Create cognoms table
        manager
            .create_table(
                Table::create()
                    .table(Cognoms::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Cognoms::Id))
                    .col(string(Cognoms::Nom))
                    .col(string_null(Cognoms::Normalitzat))
                    .col(
                        ColumnDef::new(Cognoms::ModeracioEstat)
                            .string()
                            .not_null()
                            .default("publicat"),
                    )
                    .col(big_integer_null(Cognoms::ModeratedBy))
                    .col(big_integer_null(Cognoms::ModeratedAt))
                    .col(string_null(Cognoms::ModeracioMotiu))
                    .to_owned(),
            )
            .await?;

        // Create events_historics table
        manager
            .create_table(
                Table::create()
                    .table(EventsHistorics::Table)
                    .if_not_exists()
                    .col(auto_id(manager, EventsHistorics::Id))
                    .col(string(EventsHistorics::Titol))
                    .col(string_null(EventsHistorics::Descripcio))
                    .col(string_null(EventsHistorics::Data))
                    .col(big_integer_null(EventsHistorics::MunicipiId))
                    .col(
                        ColumnDef::new(EventsHistorics::ModeracioEstat)
                            .string()
                            .not_null()
                            .default("publicat"),
                    )
                    .col(big_integer_null(EventsHistorics::ModeratedBy))
                    .col(big_integer_null(EventsHistorics::ModeratedAt))
                    .col(string_null(EventsHistorics::ModeracioMotiu))
                    .to_owned(),
            )
            .await?;

        // Create usuaris table
        manager
            .create_table(
                Table::create()
                    .table(Usuaris::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Usuaris::Id))
                    .col(string_uniq(Usuaris::Nom))
                    .col(string_null(Usuaris::Email))
                    .col(
                        ColumnDef::new(Usuaris::PermissionsVersion)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(big_integer(Usuaris::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // Create grups table
        manager
            .create_table(
                Table::create()
                    .table(Grups::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Grups::Id))
                    .col(string_uniq(Grups::Nom))
                    .to_owned(),
            )
            .await?;

        // Create grups_membres table
        manager
            .create_table(
                Table::create()
                    .table(GrupsMembres::Table)
                    .if_not_exists()
                    .col(big_integer(GrupsMembres::GrupId))
                    .col(big_integer(GrupsMembres::UsuariId))
                    .primary_key(
                        Index::create()
                            .col(GrupsMembres::GrupId)
                            .col(GrupsMembres::UsuariId),
                    )
                    .to_owned(),
            )
            .await?;

        // Create politiques table
        manager
            .create_table(
                Table::create()
                    .table(Politiques::Table)
                    .if_not_exists()
                    .col(auto_id(manager, Politiques::Id))
                    .col(string_uniq(Politiques::Nom))
                    .col(text_null(Politiques::Document))
                    .to_owned(),
            )
            .await?;

        // Create politiques_grants table
        manager
            .create_table(
                Table::create()
                    .table(PolitiquesGrants::Table)
                    .if_not_exists()
                    .col(auto_id(manager, PolitiquesGrants::Id))
                    .col(big_integer(PolitiquesGrants::PoliticaId))
                    .col(string(PolitiquesGrants::PermKey))
                    .col(string(PolitiquesGrants::ScopeType))
                    .col(big_integer_null(PolitiquesGrants::ScopeId))
                    .col(
                        ColumnDef::new(PolitiquesGrants::IncludeChildren)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on politiques_grants.politica_id
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_politiques_grants_politica")
                    .table(PolitiquesGrants::Table)
                    .col(PolitiquesGrants::PoliticaId)
                    .to_owned(),
            )
            .await?;

        // Create usuaris_politiques table
        manager
            .create_table(
                Table::create()
                    .table(UsuarisPolitiques::Table)
                    .if_not_exists()
                    .col(big_integer(UsuarisPolitiques::UsuariId))
                    .col(big_integer(UsuarisPolitiques::PoliticaId))
                    .primary_key(
                        Index::create()
                            .col(UsuarisPolitiques::UsuariId)
                            .col(UsuarisPolitiques::PoliticaId),
                    )
                    .to_owned(),
            )
            .await?;

        // Create grups_politiques table
        manager
            .create_table(
                Table::create()
                    .table(GrupsPolitiques::Table)
                    .if_not_exists()
                    .col(big_integer(GrupsPolitiques::GrupId))
                    .col(big_integer(GrupsPolitiques::PoliticaId))
                    .primary_key(
                        Index::create()
                            .col(GrupsPolitiques::GrupId)
                            .col(GrupsPolitiques::PoliticaId),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GrupsPolitiques::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UsuarisPolitiques::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PolitiquesGrants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Politiques::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GrupsMembres::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Grups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Usuaris::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EventsHistorics::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cognoms::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Persones::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ArxiusLlibres::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Llibres::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Arxius::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(EntitatsEclesiastiques::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Municipis::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(NivellsAdministratius::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Paisos::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Paisos {
    Table,
    Id,
    Nom,
    Codi,
}

#[derive(DeriveIden)]
enum NivellsAdministratius {
    Table,
    Id,
    Nom,
    Tipus,
    PaisId,
    ParentId,
}

#[derive(DeriveIden)]
enum Municipis {
    Table,
    Id,
    Nom,
    PaisId,
    RegioId,
    ProvinciaId,
    ComarcaId,
    ModeracioEstat,
    ModeratedBy,
    ModeratedAt,
    ModeracioMotiu,
}

#[derive(DeriveIden)]
enum EntitatsEclesiastiques {
    Table,
    Id,
    Nom,
    MunicipiId,
}

#[derive(DeriveIden)]
enum Arxius {
    Table,
    Id,
    Nom,
    MunicipiId,
    EntitatId,
    ModeracioEstat,
    ModeratedBy,
    ModeratedAt,
    ModeracioMotiu,
}

#[derive(DeriveIden)]
enum Llibres {
    Table,
    Id,
    Titol,
    MunicipiId,
    EntitatId,
    Anys,
    ModeracioEstat,
    ModeratedBy,
    ModeratedAt,
    ModeracioMotiu,
}

#[derive(DeriveIden)]
enum ArxiusLlibres {
    Table,
    ArxiuId,
    LlibreId,
}

#[derive(DeriveIden)]
enum Persones {
    Table,
    Id,
    Nom,
    Cognom1,
    Cognom2,
    MunicipiId,
    ModeracioEstat,
    ModeratedBy,
    ModeratedAt,
    ModeracioMotiu,
}

#[derive(DeriveIden)]
enum Cognoms {
    Table,
    Id,
    Nom,
    Normalitzat,
    ModeracioEstat,
    ModeratedBy,
    ModeratedAt,
    ModeracioMotiu,
}

#[derive(DeriveIden)]
enum EventsHistorics {
    Table,
    Id,
    Titol,
    Descripcio,
    Data,
    MunicipiId,
    ModeracioEstat,
    ModeratedBy,
    ModeratedAt,
    ModeracioMotiu,
}

#[derive(DeriveIden)]
enum Usuaris {
    Table,
    Id,
    Nom,
    Email,
    PermissionsVersion,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Grups {
    Table,
    Id,
    Nom,
}

#[derive(DeriveIden)]
enum GrupsMembres {
    Table,
    GrupId,
    UsuariId,
}

#[derive(DeriveIden)]
enum Politiques {
    Table,
    Id,
    Nom,
    Document,
}

#[derive(DeriveIden)]
enum PolitiquesGrants {
    Table,
    Id,
    PoliticaId,
    PermKey,
    ScopeType,
    ScopeId,
    IncludeChildren,
}

#[derive(DeriveIden)]
enum UsuarisPolitiques {
    Table,
    UsuariId,
    PoliticaId,
}

#[derive(DeriveIden)]
enum GrupsPolitiques {
    Table,
    GrupId,
    PoliticaId,
}

pub use sea_orm_migration::prelude::*;

mod m20260115_000001_initial_schema;
mod m20260122_000001_add_closure_and_jobs;
mod m20260201_000001_add_wiki_changes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260115_000001_initial_schema::Migration),
            Box::new(m20260122_000001_add_closure_and_jobs::Migration),
            Box::new(m20260201_000001_add_wiki_changes::Migration),
        ]
    }
}

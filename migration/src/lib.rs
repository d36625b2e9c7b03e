pub use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseConnection};

mod m20240210_153056_create_schema_and_base_db_setup;
mod m20240211_174355_create_fifo_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240210_153056_create_schema_and_base_db_setup::Migration),
            Box::new(m20240211_174355_create_fifo_tables::Migration),
        ]
    }
}

/// Creates the platform schema when missing, then applies every pending migration.
///
/// The connection's search path points at the platform schema, so it has to exist before
/// the migrations bookkeeping table can be created in it.
pub async fn run(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute_unprepared("CREATE SCHEMA IF NOT EXISTS fifo_platform;")
        .await?;
    Migrator::up(db, None).await
}

// ABOUTME: SeaORM migration module for database schema management
// ABOUTME: Creates the inventory schema on startup when it is missing

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(
            m20250301_000001_create_inventory_tables::Migration,
        )]
    }
}

pub mod m20250301_000001_create_inventory_tables;

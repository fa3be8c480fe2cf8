pub use sea_orm_migration::prelude::*;

mod m20250301_000001_users_stores;
mod m20250301_000002_ledger;
mod m20250301_000003_usage_records;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_users_stores::Migration),
            Box::new(m20250301_000002_ledger::Migration),
            Box::new(m20250301_000003_usage_records::Migration),
        ]
    }
}

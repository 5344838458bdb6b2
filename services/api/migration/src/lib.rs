pub use sea_orm_migration::MigratorTrait;
use sea_orm_migration::prelude::*;

mod m20261001_000001_create_roles;
mod m20261001_000002_create_users;
mod m20261001_000003_create_api_keys;
mod m20261001_000004_create_properties;
mod m20261001_000005_create_viewing_records;
mod m20261001_000006_add_viewing_record_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_roles::Migration),
            Box::new(m20261001_000002_create_users::Migration),
            Box::new(m20261001_000003_create_api_keys::Migration),
            Box::new(m20261001_000004_create_properties::Migration),
            Box::new(m20261001_000005_create_viewing_records::Migration),
            Box::new(m20261001_000006_add_viewing_record_indexes::Migration),
        ]
    }
}

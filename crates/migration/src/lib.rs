//! Migrator for the public partition, registered in dependency order.
//! Indexes are applied last.
//!
//! Tenant partitions are not migrated here; they are provisioned at
//! registration time by `models::partition`.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_tenant;
mod m20240101_000002_create_domain;
mod m20240101_000003_create_user;
mod m20240101_000004_create_user_credentials;
mod m20240101_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_tenant::Migration),
            Box::new(m20240101_000002_create_domain::Migration),
            Box::new(m20240101_000003_create_user::Migration),
            Box::new(m20240101_000004_create_user_credentials::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000005_add_indexes::Migration),
        ]
    }
}

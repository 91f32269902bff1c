//! Create `tenant` table.
//!
//! Root entity for multi-tenancy. `schema_name` is the partition key and
//! names the PostgreSQL schema holding the tenant's business data.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenant::Table)
                    .if_not_exists()
                    .col(uuid(Tenant::Id).primary_key())
                    .col(string_len(Tenant::Name, 100).not_null())
                    .col(string_len(Tenant::SchemaName, 63).unique_key().not_null())
                    .col(timestamp_with_time_zone(Tenant::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Tenant::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Tenant { Table, Id, Name, SchemaName, CreatedAt }

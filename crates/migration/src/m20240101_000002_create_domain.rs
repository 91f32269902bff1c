//! Create `domain` table with FK to `tenant`.
//!
//! Exact-match hostname routing table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Domain::Table)
                    .if_not_exists()
                    .col(uuid(Domain::Id).primary_key())
                    .col(string_len(Domain::Domain, 253).unique_key().not_null())
                    .col(uuid(Domain::TenantId).not_null())
                    .col(boolean(Domain::IsPrimary).not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_domain_tenant")
                            .from(Domain::Table, Domain::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Domain::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Domain { Table, Id, Domain, TenantId, IsPrimary }

#[derive(DeriveIden)]
enum Tenant { Table, Id }

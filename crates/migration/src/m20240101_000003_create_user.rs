//! Create `user` table with nullable FK to `tenant`.
//!
//! Identity lives in the public partition; `tenant_id` stays NULL until the
//! owner's tenant bootstrap completes.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(ColumnDef::new(User::TenantId).uuid().null())
                    .col(string_len(User::Username, 150).unique_key().not_null())
                    .col(string_len(User::Email, 254).unique_key().not_null())
                    .col(string_len(User::FirstName, 150).not_null().default(""))
                    .col(string_len(User::LastName, 150).not_null().default(""))
                    .col(string_len(User::Status, 32).not_null())
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_tenant")
                            .from(User::Table, User::TenantId)
                            .to(Tenant::Table, Tenant::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User { Table, Id, TenantId, Username, Email, FirstName, LastName, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Tenant { Table, Id }

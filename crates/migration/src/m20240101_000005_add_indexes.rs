use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users: index on tenant_id
        manager
            .create_index(
                Index::create()
                    .name("idx_user_tenant")
                    .table(User::Table)
                    .col(User::TenantId)
                    .to_owned(),
            )
            .await?;

        // Domain: index on tenant_id for primary-domain lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_domain_tenant")
                    .table(Domain::Table)
                    .col(Domain::TenantId)
                    .to_owned(),
            )
            .await?;

        // At most one primary domain per tenant
        manager
            .get_connection()
            .execute_unprepared(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS "uniq_domain_primary_per_tenant" ON "domain" ("tenant_id") WHERE "is_primary""#,
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(r#"DROP INDEX IF EXISTS "uniq_domain_primary_per_tenant""#)
            .await?;
        manager
            .drop_index(Index::drop().name("idx_domain_tenant").table(Domain::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_tenant").table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User { Table, TenantId }

#[derive(DeriveIden)]
enum Domain { Table, TenantId }

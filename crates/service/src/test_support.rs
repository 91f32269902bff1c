#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::connect;

// Migrations run once per test process; `false` means the database is unusable.
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// A migrated connection, or `None` when DB tests should be skipped.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        eprintln!("skip: SKIP_DB_TESTS set");
        return None;
    }
    let ready = *MIGRATED
        .get_or_init(|| async {
            match connect().await {
                Ok(db) => match migration::Migrator::up(&db, None).await {
                    Ok(()) => true,
                    Err(e) => {
                        eprintln!("skip: migrate up failed: {}", e);
                        false
                    }
                },
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {}", e);
                    false
                }
            }
        })
        .await;
    if !ready {
        return None;
    }
    // Fresh connection for the current test's runtime.
    connect().await.ok()
}

/// Drop a tenant schema left behind by a committed test.
pub async fn drop_schema(db: &DatabaseConnection, key: &models::partition::PartitionKey) {
    use sea_orm::ConnectionTrait;
    db.execute_unprepared(&format!("DROP SCHEMA IF EXISTS {} CASCADE", key.quoted())).await.ok();
}

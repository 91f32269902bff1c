use chrono::Utc;
use sea_orm::sea_query::{Alias, ColumnDef, Expr, ForeignKey, ForeignKeyAction, IntoTableRef, Order, Query, Table, TableCreateStatement, TableRef};
use sea_orm::{ConnectionTrait, DeriveIden, FromQueryResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::partition::PartitionKey;
use crate::project::{self, Project};

#[derive(DeriveIden, Clone, Copy)]
pub enum Task {
    Table,
    Id,
    ProjectId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

fn table(key: &PartitionKey) -> TableRef {
    (Alias::new(key.as_str()), Task::Table).into_table_ref()
}

pub fn create_table_stmt(key: &PartitionKey) -> TableCreateStatement {
    Table::create()
        .table(table(key))
        .if_not_exists()
        .col(ColumnDef::new(Task::Id).big_integer().not_null().auto_increment().primary_key())
        .col(ColumnDef::new(Task::ProjectId).big_integer().not_null())
        .col(ColumnDef::new(Task::Name).string_len(200).not_null())
        .col(ColumnDef::new(Task::Description).text().not_null().default(""))
        .col(ColumnDef::new(Task::CreatedAt).timestamp_with_time_zone().not_null())
        .col(ColumnDef::new(Task::UpdatedAt).timestamp_with_time_zone().not_null())
        .foreign_key(
            ForeignKey::create()
                .name(format!("fk_{}_task_project", key))
                .from(table(key), Task::ProjectId)
                .to(project::table(key), Project::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

const COLUMNS: [Task; 6] = [
    Task::Id,
    Task::ProjectId,
    Task::Name,
    Task::Description,
    Task::CreatedAt,
    Task::UpdatedAt,
];

pub async fn list_for_project<C: ConnectionTrait>(db: &C, key: &PartitionKey, project_id: i64) -> Result<Vec<Model>, ModelError> {
    list_for_projects(db, key, &[project_id]).await
}

/// Tasks of several projects in one query, ordered by id.
pub async fn list_for_projects<C: ConnectionTrait>(db: &C, key: &PartitionKey, project_ids: &[i64]) -> Result<Vec<Model>, ModelError> {
    if project_ids.is_empty() {
        return Ok(Vec::new());
    }
    let stmt = Query::select()
        .columns(COLUMNS)
        .from(table(key))
        .and_where(Expr::col(Task::ProjectId).is_in(project_ids.iter().copied()))
        .order_by(Task::Id, Order::Asc)
        .to_owned();
    Model::find_by_statement(db.get_database_backend().build(&stmt))
        .all(db)
        .await
        .map_err(ModelError::from_db)
}

pub async fn create<C: ConnectionTrait>(db: &C, key: &PartitionKey, project_id: i64, name: &str, description: &str) -> Result<Model, ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::Validation("task name required".into()));
    }
    if name.chars().count() > 200 {
        return Err(ModelError::Validation("task name too long (<=200)".into()));
    }
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut stmt = Query::insert();
    stmt.into_table(table(key))
        .columns([Task::ProjectId, Task::Name, Task::Description, Task::CreatedAt, Task::UpdatedAt])
        .values([project_id.into(), name.trim().into(), description.into(), now.into(), now.into()])
        .map_err(|e| ModelError::Db(e.to_string()))?
        .returning_all();
    Model::find_by_statement(db.get_database_backend().build(&stmt))
        .one(db)
        .await
        .map_err(ModelError::from_db)?
        .ok_or_else(|| ModelError::Db("insert returned no row".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbBackend;

    #[test]
    fn task_table_references_project_in_same_partition() {
        let key = PartitionKey::parse("acme").unwrap();
        let sql = DbBackend::Postgres.build(&create_table_stmt(&key)).to_string();
        assert!(sql.contains(r#""acme"."task""#), "{sql}");
        assert!(sql.contains(r#"REFERENCES "acme"."project""#), "{sql}");
        assert!(sql.contains("ON DELETE CASCADE"), "{sql}");
    }
}

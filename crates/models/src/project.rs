//! Projects live inside a tenant partition, so every query takes the
//! partition key and qualifies the table with it.

use chrono::Utc;
use sea_orm::sea_query::{Alias, ColumnDef, Expr, Order, Query, SimpleExpr, Table, TableCreateStatement, TableRef, IntoTableRef};
use sea_orm::{ConnectionTrait, DeriveIden, FromQueryResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::partition::PartitionKey;

#[derive(DeriveIden, Clone, Copy)]
pub enum Project {
    Table,
    Id,
    Name,
    Description,
    IsCompleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Debug, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub is_completed: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Clone, Debug, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
}

pub(crate) fn table(key: &PartitionKey) -> TableRef {
    (Alias::new(key.as_str()), Project::Table).into_table_ref()
}

pub fn create_table_stmt(key: &PartitionKey) -> TableCreateStatement {
    Table::create()
        .table(table(key))
        .if_not_exists()
        .col(ColumnDef::new(Project::Id).big_integer().not_null().auto_increment().primary_key())
        .col(ColumnDef::new(Project::Name).string_len(200).not_null())
        .col(ColumnDef::new(Project::Description).text().not_null().default(""))
        .col(ColumnDef::new(Project::IsCompleted).boolean().not_null().default(false))
        .col(ColumnDef::new(Project::CreatedAt).timestamp_with_time_zone().not_null())
        .col(ColumnDef::new(Project::UpdatedAt).timestamp_with_time_zone().not_null())
        .to_owned()
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("project name required".into())); }
    if name.chars().count() > 200 { return Err(ModelError::Validation("project name too long (<=200)".into())); }
    Ok(())
}

const COLUMNS: [Project; 6] = [
    Project::Id,
    Project::Name,
    Project::Description,
    Project::IsCompleted,
    Project::CreatedAt,
    Project::UpdatedAt,
];

pub async fn list<C: ConnectionTrait>(db: &C, key: &PartitionKey) -> Result<Vec<Model>, ModelError> {
    let stmt = Query::select()
        .columns(COLUMNS)
        .from(table(key))
        .order_by(Project::Id, Order::Asc)
        .to_owned();
    Model::find_by_statement(db.get_database_backend().build(&stmt))
        .all(db)
        .await
        .map_err(ModelError::from_db)
}

pub async fn get<C: ConnectionTrait>(db: &C, key: &PartitionKey, id: i64) -> Result<Option<Model>, ModelError> {
    let stmt = Query::select()
        .columns(COLUMNS)
        .from(table(key))
        .and_where(Expr::col(Project::Id).eq(id))
        .to_owned();
    Model::find_by_statement(db.get_database_backend().build(&stmt))
        .one(db)
        .await
        .map_err(ModelError::from_db)
}

pub async fn create<C: ConnectionTrait>(db: &C, key: &PartitionKey, name: &str, description: &str, is_completed: bool) -> Result<Model, ModelError> {
    validate_name(name)?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut stmt = Query::insert();
    stmt.into_table(table(key))
        .columns([Project::Name, Project::Description, Project::IsCompleted, Project::CreatedAt, Project::UpdatedAt])
        .values([name.trim().into(), description.into(), is_completed.into(), now.into(), now.into()])
        .map_err(|e| ModelError::Db(e.to_string()))?
        .returning_all();
    Model::find_by_statement(db.get_database_backend().build(&stmt))
        .one(db)
        .await
        .map_err(ModelError::from_db)?
        .ok_or_else(|| ModelError::Db("insert returned no row".into()))
}

pub async fn update<C: ConnectionTrait>(db: &C, key: &PartitionKey, id: i64, patch: ProjectPatch) -> Result<Option<Model>, ModelError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let mut values: Vec<(Project, SimpleExpr)> = vec![(Project::UpdatedAt, now.into())];
    if let Some(name) = patch.name {
        validate_name(&name)?;
        values.push((Project::Name, name.trim().into()));
    }
    if let Some(description) = patch.description {
        values.push((Project::Description, description.into()));
    }
    if let Some(done) = patch.is_completed {
        values.push((Project::IsCompleted, done.into()));
    }
    let stmt = Query::update()
        .table(table(key))
        .values(values)
        .and_where(Expr::col(Project::Id).eq(id))
        .returning_all()
        .to_owned();
    Model::find_by_statement(db.get_database_backend().build(&stmt))
        .one(db)
        .await
        .map_err(ModelError::from_db)
}

/// Returns whether a row was removed. Tasks go with it through the cascade.
pub async fn delete<C: ConnectionTrait>(db: &C, key: &PartitionKey, id: i64) -> Result<bool, ModelError> {
    let stmt = Query::delete()
        .from_table(table(key))
        .and_where(Expr::col(Project::Id).eq(id))
        .to_owned();
    let res = db.execute(db.get_database_backend().build(&stmt)).await.map_err(ModelError::from_db)?;
    Ok(res.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbBackend;

    #[test]
    fn table_is_schema_qualified() {
        let key = PartitionKey::parse("acme").unwrap();
        let sql = DbBackend::Postgres.build(&create_table_stmt(&key)).to_string();
        assert!(sql.contains(r#""acme"."project""#), "{sql}");
        assert!(sql.contains("bigserial"), "{sql}");
    }

    #[test]
    fn name_validation() {
        assert!(validate_name("Launch").is_ok());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }
}

use sea_orm::{entity::prelude::*, ConnectionTrait, QueryFilter, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::partition::{self, PartitionKey};
use crate::{domain, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub schema_name: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("organization name required".into())); }
    if name.chars().count() > 100 { return Err(ModelError::Validation("organization name too long (<=100)".into())); }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, name: &str, key: &PartitionKey) -> Result<Model, ModelError> {
    validate_name(name)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        schema_name: Set(key.as_str().to_string()),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(ModelError::from_db)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Entity::find_by_id(id).one(db).await.map_err(ModelError::from_db)
}

pub async fn find_by_schema<C: ConnectionTrait>(db: &C, key: &PartitionKey) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::SchemaName.eq(key.as_str()))
        .one(db)
        .await
        .map_err(ModelError::from_db)
}

/// Provision the partition, then insert tenant, primary domain and the owner
/// link. Pass a transaction to make the whole sequence atomic.
pub async fn create_with_domain<C: ConnectionTrait>(
    db: &C,
    name: &str,
    key: &PartitionKey,
    hostname: &str,
    owner_id: Uuid,
) -> Result<(Model, domain::Model), ModelError> {
    validate_name(name)?;
    if find_by_schema(db, key).await?.is_some() {
        return Err(ModelError::Conflict(format!("tenant partition {key} already exists")));
    }
    partition::provision(db, key).await?;
    let tenant = create(db, name, key).await?;
    let dom = domain::create(db, hostname, tenant.id, true).await?;
    user::link_tenant(db, owner_id, tenant.id).await?;
    Ok((tenant, dom))
}

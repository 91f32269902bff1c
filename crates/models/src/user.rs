use sea_orm::{entity::prelude::*, ConnectionTrait, QueryFilter, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::tenant;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Tenant,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Tenant => Entity::belongs_to(tenant::Entity).from(Column::TenantId).to(tenant::Column::Id).into() }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields needed to create a user row.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    if username.trim().is_empty() { return Err(ModelError::Validation("username required".into())); }
    if username.chars().count() > 150 { return Err(ModelError::Validation("username too long (<=150)".into())); }
    if username.chars().any(char::is_whitespace) { return Err(ModelError::Validation("username must not contain spaces".into())); }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let at = email.find('@').ok_or_else(|| ModelError::Validation("invalid email".into()))?;
    if at == 0 || at + 1 >= email.len() || email.len() > 254 {
        return Err(ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(db: &C, new: &NewUser) -> Result<Model, ModelError> {
    validate_username(&new.username)?;
    validate_email(&new.email)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(None),
        username: Set(new.username.clone()),
        email: Set(new.email.clone()),
        first_name: Set(new.first_name.clone()),
        last_name: Set(new.last_name.clone()),
        status: Set("active".into()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(ModelError::from_db)
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Model>, ModelError> {
    Entity::find_by_id(id).one(db).await.map_err(ModelError::from_db)
}

pub async fn find_by_username<C: ConnectionTrait>(db: &C, username: &str) -> Result<Option<Model>, ModelError> {
    Entity::find().filter(Column::Username.eq(username)).one(db).await.map_err(ModelError::from_db)
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, ModelError> {
    Entity::find().filter(Column::Email.eq(email)).one(db).await.map_err(ModelError::from_db)
}

/// Attach a user to its tenant once the tenant exists.
pub async fn link_tenant<C: ConnectionTrait>(db: &C, id: Uuid, tenant_id: Uuid) -> Result<Model, ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(ModelError::from_db)?
        .ok_or_else(|| ModelError::NotFound("user".into()))?
        .into();
    found.tenant_id = Set(Some(tenant_id));
    found.updated_at = Set(Utc::now().into());
    found.update(db).await.map_err(ModelError::from_db)
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await.map_err(ModelError::from_db)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("ab.com").is_err());
        assert!(validate_email("@b.com").is_err());
        assert!(validate_email("a@").is_err());
    }

    #[test]
    fn username_validation() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("  ").is_err());
        assert!(validate_username("al ice").is_err());
    }
}

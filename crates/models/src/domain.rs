use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, QueryFilter, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::tenant;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "domain")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub domain: String,
    pub tenant_id: Uuid,
    pub is_primary: bool,
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

impl Related<tenant::Entity> for Entity {
    fn to() -> RelationDef { Relation::Tenant.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Hostnames are stored lower-case and without port.
pub fn validate_hostname(hostname: &str) -> Result<(), ModelError> {
    if hostname.is_empty() { return Err(ModelError::Validation("hostname required".into())); }
    if hostname.len() > 253 { return Err(ModelError::Validation("hostname too long (<=253)".into())); }
    if hostname.contains(':') || hostname.contains('/') || hostname.chars().any(char::is_whitespace) {
        return Err(ModelError::Validation(format!("invalid hostname: {hostname}")));
    }
    if hostname != hostname.to_ascii_lowercase() {
        return Err(ModelError::Validation("hostname must be lower-case".into()));
    }
    Ok(())
}

/// Insert a domain. A new primary demotes the tenant's previous primary first,
/// so each tenant keeps at most one.
pub async fn create<C: ConnectionTrait>(db: &C, hostname: &str, tenant_id: Uuid, is_primary: bool) -> Result<Model, ModelError> {
    validate_hostname(hostname)?;
    if is_primary {
        Entity::update_many()
            .col_expr(Column::IsPrimary, Expr::value(false))
            .filter(Column::TenantId.eq(tenant_id))
            .filter(Column::IsPrimary.eq(true))
            .exec(db)
            .await
            .map_err(ModelError::from_db)?;
    }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        domain: Set(hostname.to_string()),
        tenant_id: Set(tenant_id),
        is_primary: Set(is_primary),
    };
    am.insert(db).await.map_err(ModelError::from_db)
}

/// Exact-match lookup joined with the owning tenant.
pub async fn find_with_tenant<C: ConnectionTrait>(db: &C, hostname: &str) -> Result<Option<(Model, tenant::Model)>, ModelError> {
    let found = Entity::find()
        .filter(Column::Domain.eq(hostname))
        .find_also_related(tenant::Entity)
        .one(db)
        .await
        .map_err(ModelError::from_db)?;
    Ok(found.and_then(|(d, t)| t.map(|t| (d, t))))
}

pub async fn primary_for_tenant<C: ConnectionTrait>(db: &C, tenant_id: Uuid) -> Result<Option<Model>, ModelError> {
    Entity::find()
        .filter(Column::TenantId.eq(tenant_id))
        .filter(Column::IsPrimary.eq(true))
        .one(db)
        .await
        .map_err(ModelError::from_db)
}

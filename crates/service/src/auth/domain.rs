use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tenancy::domain::TenantSummary;

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub organization: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Domain user (business view)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tenant_id: Option<Uuid>,
}

impl From<models::user::Model> for AuthUser {
    fn from(u: models::user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            tenant_id: u.tenant_id,
        }
    }
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Everything needed to persist a new account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// An established identity, independent of how it is transported.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: AuthUser,
    pub tenant: Option<TenantSummary>,
    /// Tenant entry URL; `None` for users without a tenant.
    pub redirect_url: Option<String>,
}

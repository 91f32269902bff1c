use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;
use crate::tenancy::domain::TenantSummary;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub tenant_id: Option<Uuid>,
    pub tenant_name: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// HS256 token issue/verify with a fixed lifetime.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::seconds(lifetime_secs),
        }
    }

    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        Self::new(&cfg.jwt_secret, cfg.token_lifetime_secs)
    }

    pub fn lifetime_secs(&self) -> i64 { self.lifetime.num_seconds() }

    pub fn issue(&self, user: &AuthUser, tenant: Option<&TenantSummary>) -> Result<String, AuthError> {
        self.issue_at(user, tenant, Utc::now())
    }

    pub fn issue_at(&self, user: &AuthUser, tenant: Option<&TenantSummary>, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            tenant_id: tenant.map(|t| t.id),
            tenant_name: tenant.map(|t| t.name.clone()),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| AuthError::TokenError(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Signature check by the library, expiry checked here against `now`
    /// with no leeway.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| AuthError::TokenError(e.to_string()))?;
        if now.timestamp() >= data.claims.exp {
            return Err(AuthError::TokenError("token expired".into()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            first_name: String::new(),
            last_name: String::new(),
            tenant_id: None,
        }
    }

    fn issued_at() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() }

    #[test]
    fn valid_until_lifetime_ends() {
        let codec = TokenCodec::new("secret", 86_400);
        let t = issued_at();
        let token = codec.issue_at(&user(), None, t).unwrap();
        assert!(codec.verify_at(&token, t + Duration::hours(23) + Duration::minutes(59)).is_ok());
        assert!(matches!(
            codec.verify_at(&token, t + Duration::hours(24) + Duration::minutes(1)),
            Err(AuthError::TokenError(_))
        ));
    }

    #[test]
    fn claims_carry_identity_and_tenant() {
        let codec = TokenCodec::new("secret", 86_400);
        let u = user();
        let tenant = TenantSummary {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            schema_name: models::partition::PartitionKey::parse("acme").unwrap(),
            created_on: issued_at(),
        };
        let token = codec.issue_at(&u, Some(&tenant), issued_at()).unwrap();
        let claims = codec.verify_at(&token, issued_at()).unwrap();
        assert_eq!(claims.user_id, u.id);
        assert_eq!(claims.tenant_id, Some(tenant.id));
        assert_eq!(claims.tenant_name.as_deref(), Some("Acme"));
        assert_eq!(claims.exp - claims.iat, 86_400);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let codec = TokenCodec::new("secret", 86_400);
        let token = codec.issue_at(&user(), None, issued_at()).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;
        let mid = sig_start + (token.len() - sig_start) / 2;
        let mut bytes = token.into_bytes();
        bytes[mid] = if bytes[mid] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();
        assert!(codec.verify_at(&tampered, issued_at()).is_err());
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = TokenCodec::new("secret", 86_400).issue_at(&user(), None, issued_at()).unwrap();
        assert!(TokenCodec::new("other", 86_400).verify_at(&token, issued_at()).is_err());
    }
}

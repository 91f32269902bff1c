//! Server-tracked login sessions for the cookie transport.

use std::time::Duration;

use axum_extra::extract::cookie::{Cookie, SameSite};
use moka::future::Cache;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "sessionid";

/// Opaque session id to user id, expiring after a fixed TTL.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, Uuid>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { cache: Cache::builder().max_capacity(100_000).time_to_live(ttl).build() }
    }

    pub async fn create(&self, user_id: Uuid) -> String {
        let id = Uuid::new_v4().simple().to_string();
        self.cache.insert(id.clone(), user_id).await;
        id
    }

    pub async fn user_id(&self, session_id: &str) -> Option<Uuid> {
        self.cache.get(session_id).await
    }

    pub async fn remove(&self, session_id: &str) {
        self.cache.invalidate(session_id).await;
    }
}

pub fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Removal cookie; path must match the one used when setting it.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_resolve_until_removed() {
        let store = SessionStore::new(Duration::from_secs(60));
        let user = Uuid::new_v4();
        let id = store.create(user).await;
        assert_eq!(store.user_id(&id).await, Some(user));
        store.remove(&id).await;
        assert_eq!(store.user_id(&id).await, None);
        assert_eq!(store.user_id("unknown").await, None);
    }

    #[test]
    fn cookie_attributes() {
        let c = session_cookie("abc".into());
        assert_eq!(c.name(), "sessionid");
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Lax));
        assert_eq!(c.path(), Some("/"));
    }
}

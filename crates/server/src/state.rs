use std::sync::Arc;
use std::time::Duration;

use configs::AppConfig;
use sea_orm::DatabaseConnection;
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::repository::AuthRepository;
use service::auth::service::AuthConfig;
use service::auth::{AuthService, SessionValidator, TokenCodec};
use service::projects::repo::seaorm::SeaOrmProjectRepository;
use service::projects::repository::ProjectRepository;
use service::projects::ProjectService;
use service::tenancy::repo::seaorm::SeaOrmTenancyRepository;
use service::tenancy::repository::TenancyRepository;
use service::tenancy::{RedirectResolver, TenantRegistry, TenantResolver};

use crate::session::SessionStore;

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub validator: Arc<SessionValidator>,
    pub codec: Arc<TokenCodec>,
    pub resolver: Arc<TenantResolver>,
    pub redirects: Arc<RedirectResolver>,
    pub projects: Arc<ProjectService>,
    pub sessions: SessionStore,
}

impl ServerState {
    /// Wire services over any repository implementation.
    pub fn new(
        users: Arc<dyn AuthRepository>,
        tenants: Arc<dyn TenancyRepository>,
        projects: Arc<dyn ProjectRepository>,
        cfg: &AppConfig,
    ) -> Self {
        let codec = Arc::new(TokenCodec::from_config(&cfg.auth));
        let registry = Arc::new(TenantRegistry::from_config(tenants.clone(), &cfg.tenancy));
        let redirects = Arc::new(RedirectResolver::from_config(tenants.clone(), &cfg.tenancy));
        let auth = Arc::new(AuthService::new(
            users.clone(),
            tenants.clone(),
            registry,
            redirects.clone(),
            AuthConfig { password_algorithm: cfg.auth.password_algorithm.clone() },
        ));
        Self {
            auth,
            validator: Arc::new(SessionValidator::new(codec.clone(), users, tenants.clone())),
            codec,
            resolver: Arc::new(TenantResolver::from_config(tenants, &cfg.tenancy)),
            redirects,
            projects: Arc::new(ProjectService::new(projects)),
            sessions: SessionStore::new(Duration::from_secs(cfg.auth.session_ttl_secs)),
        }
    }

    pub fn from_db(db: DatabaseConnection, cfg: &AppConfig) -> Self {
        Self::new(
            Arc::new(SeaOrmAuthRepository { db: db.clone() }),
            Arc::new(SeaOrmTenancyRepository { db: db.clone() }),
            Arc::new(SeaOrmProjectRepository { db }),
            cfg,
        )
    }
}

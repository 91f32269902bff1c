use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use migration::{Migrator, MigratorTrait};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes;
use crate::state::ServerState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Router over an already wired state. Tests call this with in-memory repositories.
pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

/// Connect, migrate the public schema, then serve until the listener fails.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    Migrator::up(&db, None).await?;
    info!(event = "migrations_applied", "public schema up to date");

    let app = build_app(ServerState::from_db(db, &cfg));

    let addr = bind_addr(&cfg)?;
    info!(%addr, base_domain = %cfg.tenancy.base_domain, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_uses_loaded_server_section() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "0.0.0.0".into();
        cfg.server.port = 9100;
        assert_eq!(bind_addr(&cfg).unwrap(), "0.0.0.0:9100".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn bind_addr_rejects_unparsable_host() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not a host".into();
        assert!(bind_addr(&cfg).is_err());
    }
}

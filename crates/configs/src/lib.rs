use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub tenancy: TenancyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8000, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

/// Credential and session settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret shared by every server instance.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: i64,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    /// Password hashing algorithm label stored next to each hash.
    #[serde(default = "default_password_algorithm")]
    pub password_algorithm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: default_token_lifetime_secs(),
            session_ttl_secs: default_session_ttl_secs(),
            password_algorithm: default_password_algorithm(),
        }
    }
}

fn default_token_lifetime_secs() -> i64 { 24 * 60 * 60 }
fn default_session_ttl_secs() -> u64 { 14 * 24 * 60 * 60 }
fn default_password_algorithm() -> String { "argon2".into() }

/// Tenant routing settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TenancyConfig {
    /// Suffix appended to a partition key to build its primary domain.
    #[serde(default = "default_base_domain")]
    pub base_domain: String,
    #[serde(default = "default_redirect_scheme")]
    pub redirect_scheme: String,
    #[serde(default = "default_redirect_port")]
    pub redirect_port: u16,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Request paths starting with one of these are always served from the public partition.
    #[serde(default = "default_public_path_prefixes")]
    pub public_path_prefixes: Vec<String>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            base_domain: default_base_domain(),
            redirect_scheme: default_redirect_scheme(),
            redirect_port: default_redirect_port(),
            login_path: default_login_path(),
            public_path_prefixes: default_public_path_prefixes(),
        }
    }
}

fn default_base_domain() -> String { "localhost".into() }
fn default_redirect_scheme() -> String { "http".into() }
fn default_redirect_port() -> u16 { 8000 }
fn default_login_path() -> String { "/auth/login/".into() }
fn default_public_path_prefixes() -> Vec<String> { vec!["/auth/login".into()] }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

/// Like [`load_from_file`], but a file that does not exist yields the defaults.
/// Read and parse errors of an existing file are returned.
pub fn load_from_file_or_default(path: &str) -> Result<AppConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse(&content).map_err(|e| anyhow!("{path}: {e}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(anyhow!("{path}: {e}")),
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load_and_validate`], but a missing config file falls
    /// back to defaults filled from the environment. A broken file is an error.
    pub fn load_or_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = load_from_file_or_default(&config_path())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.tenancy.normalize_from_env();
        self.tenancy.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() { self.host = host; }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.port = port;
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.token_lifetime_secs <= 0 {
            return Err(anyhow!("auth.token_lifetime_secs must be positive"));
        }
        if self.session_ttl_secs == 0 {
            return Err(anyhow!("auth.session_ttl_secs must be positive"));
        }
        Ok(())
    }
}

impl TenancyConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(base) = std::env::var("BASE_DOMAIN") {
            if !base.trim().is_empty() { self.base_domain = base; }
        }
        self.base_domain = self.base_domain.trim().trim_start_matches('.').to_lowercase();
        if !self.login_path.starts_with('/') {
            self.login_path = format!("/{}", self.login_path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_domain.is_empty() {
            return Err(anyhow!("tenancy.base_domain is empty"));
        }
        if self.redirect_scheme != "http" && self.redirect_scheme != "https" {
            return Err(anyhow!("tenancy.redirect_scheme must be http or https"));
        }
        if self.redirect_port == 0 {
            return Err(anyhow!("tenancy.redirect_port must be in 1..=65535"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fills_section_defaults() {
        let cfg = parse("[server]\nhost = \"0.0.0.0\"\nport = 9000\n").unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.auth.token_lifetime_secs, 86_400);
        assert_eq!(cfg.tenancy.base_domain, "localhost");
        assert_eq!(cfg.tenancy.redirect_port, 8000);
        assert_eq!(cfg.tenancy.public_path_prefixes, vec!["/auth/login".to_string()]);
        assert_eq!(cfg.database.max_connections, 10);
    }

    #[test]
    fn database_validation_rejects_non_postgres_url() {
        let db = DatabaseConfig { url: "mysql://localhost/x".into(), ..Default::default() };
        assert!(db.validate().is_err());
        let db = DatabaseConfig { url: "postgres://localhost/x".into(), ..Default::default() };
        assert!(db.validate().is_ok());
    }

    #[test]
    fn database_validation_checks_pool_bounds() {
        let db = DatabaseConfig { url: "postgres://h/x".into(), min_connections: 5, max_connections: 2, ..Default::default() };
        assert!(db.validate().is_err());
    }

    #[test]
    fn auth_validation_requires_secret_and_lifetime() {
        let auth = AuthConfig::default();
        assert!(auth.validate().is_err());
        let auth = AuthConfig { jwt_secret: "s".into(), token_lifetime_secs: 0, ..Default::default() };
        assert!(auth.validate().is_err());
        let auth = AuthConfig { jwt_secret: "s".into(), ..Default::default() };
        assert!(auth.validate().is_ok());
    }

    fn scratch_file(name: &str, content: &str) -> String {
        let path = std::env::temp_dir().join(format!("taskhub-{}-{name}", std::process::id()));
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_from_file_or_default("/nonexistent/taskhub/config.toml").unwrap();
        assert_eq!(cfg.tenancy.base_domain, "localhost");
    }

    #[test]
    fn malformed_file_is_an_error_not_defaults() {
        let path = scratch_file("broken.toml", "[tenancy]\nbase_domain = \"example.com\"\n[auth\n");
        let err = load_from_file_or_default(&path).unwrap_err();
        assert!(err.to_string().contains(&path));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn existing_file_is_used() {
        let path = scratch_file("good.toml", "[tenancy]\nbase_domain = \"example.com\"\n");
        let cfg = load_from_file_or_default(&path).unwrap();
        assert_eq!(cfg.tenancy.base_domain, "example.com");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn tenancy_validation_checks_scheme() {
        let t = TenancyConfig { redirect_scheme: "ftp".into(), ..Default::default() };
        assert!(t.validate().is_err());
        assert!(TenancyConfig::default().validate().is_ok());
    }
}

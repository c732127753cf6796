//! Configuration types and loading
//!
//! Precedence, lowest first: built-in defaults, optional `config/pilot.*`
//! file, `PILOT__SECTION__KEY` environment variables, then the well-known
//! platform variables (`DATABASE_URL`, `HOST`, `PORT`, ...).

use serde::{Deserialize, Serialize};

use crate::error::PilotError;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Empty means "run without a database"
    pub url: String,
    pub pool_size: u32,
    pub pool_timeout_seconds: u64,
    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: 10,
            pool_timeout_seconds: 30,
            run_migrations: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
    pub max_body_size_bytes: usize,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_seconds: 30,
            max_body_size_bytes: 2 * 1024 * 1024,
            log_json: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 secret used to validate bearer tokens
    pub jwt_secret: String,
    /// Expected `iss` claim, if any
    pub jwt_issuer: Option<String>,
    /// Expected `aud` claim, if any
    pub jwt_audience: Option<String>,
    /// When false, requests without a token act as the anonymous user
    pub require_authentication: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production-please-32b".to_string(),
            jwt_issuer: None,
            jwt_audience: None,
            require_authentication: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Report stale non-terminal sessions as expired
    pub session_expiry: bool,
    /// Allow users to share sessions with other users
    pub session_sharing: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            session_expiry: true,
            session_sharing: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and the environment
    pub fn load() -> Result<Self, PilotError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/pilot").required(false))
            .add_source(
                config::Environment::with_prefix("PILOT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PilotError::Config(e.to_string()))?;

        let mut config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| PilotError::Config(e.to_string()))?;

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from well-known environment variables only
    pub fn from_env() -> Result<Self, PilotError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        // Database - DATABASE_URL first, then libpq style variables
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        } else if let Some(url) = Self::database_url_from_pg_env() {
            self.database.url = url;
        }
        if let Ok(size) = std::env::var("DATABASE_POOL_SIZE") {
            self.database.pool_size = size.parse().unwrap_or(self.database.pool_size);
        }

        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.parse().unwrap_or(self.server.port);
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
    }

    fn validate(&self) -> Result<(), PilotError> {
        if self.auth.jwt_secret.len() < 32 {
            return Err(PilotError::Config(
                "auth.jwt_secret must be at least 32 bytes".to_string(),
            ));
        }
        if self.database.pool_size == 0 {
            return Err(PilotError::Config(
                "database.pool_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Build a DATABASE_URL from PGHOST, PGPORT, PGUSER, PGPASSWORD, PGDATABASE
    pub fn database_url_from_pg_env() -> Option<String> {
        let host = std::env::var("PGHOST").ok()?;
        let port = std::env::var("PGPORT").unwrap_or_else(|_| "5432".to_string());
        let user = std::env::var("PGUSER").ok()?;
        let password = std::env::var("PGPASSWORD").ok()?;
        let database = std::env::var("PGDATABASE").ok()?;

        Some(format!(
            "postgres://{}:{}@{}:{}/{}",
            user, password, host, port, database
        ))
    }

    pub fn has_database(&self) -> bool {
        !self.database.url.is_empty()
    }

    /// Get the server address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::SocketAddr;
        let ip: std::net::IpAddr = self.server.host.parse().unwrap_or([0, 0, 0, 0].into());
        SocketAddr::new(ip, self.server.port)
    }
}

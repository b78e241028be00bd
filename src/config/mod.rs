use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub pagination: PaginationConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub page_size: i64,
    pub max_limit: i64,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub enable_query_logging: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

/// Where the column permission table comes from at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionSource {
    /// The table compiled into the binary
    Static,
    /// `relation_column` joined with `column_permission`
    Database,
    /// A YAML file produced by `permissions export`
    File(String),
}

impl PermissionSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "static" | "" => Some(PermissionSource::Static),
            "database" | "db" => Some(PermissionSource::Database),
            other => other
                .strip_prefix("file:")
                .filter(|path| !path.is_empty())
                .map(|path| PermissionSource::File(path.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    pub source: PermissionSource,
}

impl Environment {
    fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Overwrite `target` with the parsed value of `key` when it is set.
/// Unparsable values keep the preset and are logged.
fn env_parse<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = env::var(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring unparsable {}='{}'", key, raw),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::preset(Environment::from_env()).with_env_overrides()
    }

    /// Defaults per environment before any variable is applied.
    fn preset(environment: Environment) -> Self {
        let (max_limit, max_connections, acquire_timeout_secs, slow_query_threshold_ms, body_mb, jwt_expiry_hours) =
            match environment {
                Environment::Development => (1000, 10, 30, 100, 10, 24 * 7),
                Environment::Staging => (500, 20, 10, 500, 5, 24),
                Environment::Production => (100, 50, 5, 1000, 2, 4),
            };
        let development = matches!(environment, Environment::Development);
        let cors_origins = match environment {
            Environment::Development => vec!["http://localhost:3000", "http://localhost:5173"],
            Environment::Staging => vec!["https://staging.example.org"],
            Environment::Production => vec!["https://data.example.org"],
        };

        Self {
            pagination: PaginationConfig {
                page_size: 100,
                max_limit,
                debug_logging: development,
            },
            database: DatabaseConfig {
                url: None,
                max_connections,
                acquire_timeout_secs,
                enable_query_logging: !matches!(environment, Environment::Production),
                slow_query_threshold_ms,
            },
            api: ApiConfig {
                port: 5000,
                enable_request_logging: !matches!(environment, Environment::Production),
                max_request_size_bytes: body_mb * 1024 * 1024,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: cors_origins.into_iter().map(str::to_string).collect(),
                // Deployed environments must supply JWT_SECRET_KEY
                jwt_secret: if development { "development-only-secret".to_string() } else { String::new() },
                jwt_expiry_hours,
            },
            permissions: PermissionsConfig {
                source: PermissionSource::Static,
            },
            environment,
        }
    }

    fn with_env_overrides(mut self) -> Self {
        env_parse("PAGINATION_PAGE_SIZE", &mut self.pagination.page_size);
        env_parse("PAGINATION_MAX_LIMIT", &mut self.pagination.max_limit);
        env_parse("PAGINATION_DEBUG_LOGGING", &mut self.pagination.debug_logging);

        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = Some(url);
        }
        env_parse("DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        env_parse("DATABASE_ACQUIRE_TIMEOUT", &mut self.database.acquire_timeout_secs);
        env_parse("DATABASE_ENABLE_QUERY_LOGGING", &mut self.database.enable_query_logging);
        env_parse("DATABASE_SLOW_QUERY_THRESHOLD_MS", &mut self.database.slow_query_threshold_ms);

        // PORT is the fallback used by most hosting platforms
        env_parse("PORT", &mut self.api.port);
        env_parse("CATALOG_API_PORT", &mut self.api.port);
        env_parse("API_ENABLE_REQUEST_LOGGING", &mut self.api.enable_request_logging);
        env_parse("API_MAX_REQUEST_SIZE_BYTES", &mut self.api.max_request_size_bytes);

        env_parse("SECURITY_ENABLE_CORS", &mut self.security.enable_cors);
        if let Ok(origins) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(secret) = env::var("JWT_SECRET_KEY") {
            self.security.jwt_secret = secret;
        }
        env_parse("SECURITY_JWT_EXPIRY_HOURS", &mut self.security.jwt_expiry_hours);

        if let Ok(v) = env::var("CATALOG_PERMISSION_SOURCE") {
            match PermissionSource::parse(&v) {
                Some(source) => self.permissions.source = source,
                None => tracing::warn!("Ignoring unrecognized CATALOG_PERMISSION_SOURCE '{}'", v),
            }
        }

        self
    }
}

/// Read once, on first use.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

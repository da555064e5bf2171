use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub pagination: PaginationConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub security: SecurityConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size when the request does not specify `take`.
    pub default_take: i64,
    /// Ceiling applied by the HTTP layer; the pagination core itself does
    /// not enforce one.
    pub max_take: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Expiry of the recent-movies cache entry, in milliseconds.
    pub recent_movies_ttl_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub access_token_expiry_secs: u64,
    pub refresh_token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Root of the public upload tree; temp files land in `<dir>/temp`,
    /// committed movie files in `<dir>/movie`.
    pub dir: String,
    pub max_file_size_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Environment defaults first, then specific env var overrides
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PAGINATION_DEFAULT_TAKE") {
            self.pagination.default_take = v.parse().unwrap_or(self.pagination.default_take);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_TAKE") {
            self.pagination.max_take = v.parse().unwrap_or(self.pagination.max_take);
        }

        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        if let Ok(v) = env::var("CACHE_RECENT_MOVIES_TTL_MS") {
            self.cache.recent_movies_ttl_ms = v.parse().unwrap_or(self.cache.recent_movies_ttl_ms);
        }

        if let Ok(v) = env::var("ACCESS_TOKEN_SECRET") {
            self.security.access_token_secret = v;
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_SECRET") {
            self.security.refresh_token_secret = v;
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRY_SECS") {
            self.security.access_token_expiry_secs =
                v.parse().unwrap_or(self.security.access_token_expiry_secs);
        }
        if let Ok(v) = env::var("REFRESH_TOKEN_EXPIRY_HOURS") {
            self.security.refresh_token_expiry_hours = v
                .parse()
                .unwrap_or(self.security.refresh_token_expiry_hours);
        }

        if let Ok(v) = env::var("UPLOAD_DIR") {
            self.upload.dir = v;
        }
        if let Ok(v) = env::var("UPLOAD_MAX_FILE_SIZE_BYTES") {
            self.upload.max_file_size_bytes =
                v.parse().unwrap_or(self.upload.max_file_size_bytes);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            pagination: PaginationConfig {
                default_take: 5,
                max_take: 100,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            cache: CacheConfig {
                recent_movies_ttl_ms: 3000,
            },
            security: SecurityConfig {
                access_token_secret: "dev-access-secret".to_string(),
                refresh_token_secret: "dev-refresh-secret".to_string(),
                access_token_expiry_secs: 300,
                refresh_token_expiry_hours: 24,
            },
            upload: UploadConfig {
                dir: "public".to_string(),
                max_file_size_bytes: 20 * 1000 * 1000, // 20MB
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            pagination: PaginationConfig {
                default_take: 5,
                max_take: 50,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            cache: CacheConfig {
                recent_movies_ttl_ms: 3000,
            },
            security: SecurityConfig {
                access_token_secret: String::new(),
                refresh_token_secret: String::new(),
                access_token_expiry_secs: 300,
                refresh_token_expiry_hours: 24,
            },
            upload: UploadConfig {
                dir: "public".to_string(),
                max_file_size_bytes: 20 * 1000 * 1000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            pagination: PaginationConfig {
                default_take: 5,
                max_take: 50,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            cache: CacheConfig {
                recent_movies_ttl_ms: 3000,
            },
            // Secrets must come from env in production
            security: SecurityConfig {
                access_token_secret: String::new(),
                refresh_token_secret: String::new(),
                access_token_expiry_secs: 300,
                refresh_token_expiry_hours: 24,
            },
            upload: UploadConfig {
                dir: "public".to_string(),
                max_file_size_bytes: 20 * 1000 * 1000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert_eq!(config.pagination.default_take, 5);
        assert_eq!(config.cache.recent_movies_ttl_ms, 3000);
        assert!(!config.security.access_token_secret.is_empty());
    }

    #[test]
    fn production_requires_secrets_from_env() {
        let config = AppConfig::production();
        assert!(config.security.access_token_secret.is_empty());
        assert!(config.security.refresh_token_secret.is_empty());
        assert_eq!(config.pagination.max_take, 50);
    }
}

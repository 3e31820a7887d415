use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEV_JWT_SECRET: &str = "dev-only-invoicing-secret";

#[derive(Debug, Clone)]
pub struct InvoicingConfig {
    pub common: core_config::Config,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. When unset outside production, invoices live in memory.
    pub url: Option<Secret<String>>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret shared with the session provider.
    pub jwt_secret: Secret<String>,
}

impl InvoicingConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT")
            .map(|v| v == "prod")
            .unwrap_or_else(|_| common_config.is_production());

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(Secret::new(url)),
            _ if is_prod => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "DATABASE_URL is required in production but not set"
                )))
            }
            _ => None,
        };

        Ok(InvoicingConfig {
            common: common_config,
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(get_env("JWT_SECRET", Some(DEV_JWT_SECRET), is_prod)?),
            },
        })
    }

    /// Configuration for tests and local tooling: in-memory store, given secret.
    pub fn for_tests(jwt_secret: &str) -> Self {
        InvoicingConfig {
            common: core_config::Config::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
                min_connections: 0,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(jwt_secret.to_string()),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.common.is_production()
            || env::var("ENVIRONMENT").map(|v| v == "prod").unwrap_or(false)
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

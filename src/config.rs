use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_STEADFAST_BASE_URL: &str = "https://portal.packzy.com/api/v1";
const DEFAULT_COURIER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable '{0}'")]
    Missing(&'static str),
    #[error("Invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Debug, Clone)]
pub struct CourierConfig {
    pub base_url: String,
    pub api_key: Secret,
    pub secret_key: Secret,
    pub timeout: Duration,
}

/// Process configuration, read once at start-up and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Secret,
    pub courier: CourierConfig,
    pub auth_jwt_secret: Option<Secret>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let port = match optional("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "PORT",
                reason: e.to_string(),
            })?,
            None => 8080,
        };
        let timeout_secs = match optional("COURIER_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        var: "COURIER_TIMEOUT_SECS",
                        reason: "must be greater than zero".to_string(),
                    })
                }
                Ok(secs) => secs,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        var: "COURIER_TIMEOUT_SECS",
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_COURIER_TIMEOUT_SECS,
        };

        Ok(AppConfig {
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_url: Secret::new(required("DATABASE_URL")?),
            courier: CourierConfig {
                base_url: optional("STEADFAST_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_STEADFAST_BASE_URL.to_string()),
                api_key: Secret::new(required("STEADFAST_API_KEY")?),
                secret_key: Secret::new(required("STEADFAST_SECRET_KEY")?),
                timeout: Duration::from_secs(timeout_secs),
            },
            auth_jwt_secret: optional("AUTH_JWT_SECRET").map(Secret::new),
        })
    }
}

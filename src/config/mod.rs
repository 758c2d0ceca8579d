//! Configuration loading for the field-service API.
//!
//! Loads layered `.env` files and environment variables prefixed with
//! `URGENCE_`, producing a typed [`AppConfig`]. Precedence, lowest to
//! highest: `.env`, `.env.local`, `.env.<profile>`, `.env.<profile>.local`,
//! then the process environment.

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application configuration derived from `URGENCE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_acquire_timeout_ms")]
    pub db_acquire_timeout_ms: u64,
    /// Secret used to sign technician bearer tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token lifetime in days (the mobile app holds long-lived sessions).
    #[serde(default = "default_jwt_ttl_days")]
    pub jwt_ttl_days: i64,
    /// Push-notification gateway endpoint; push is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_gateway_url: Option<String>,
}

fn default_profile() -> String {
    "dev".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_database_url() -> String {
    "postgres://localhost:5432/urgence".to_string()
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_acquire_timeout_ms() -> u64 {
    5_000
}

fn default_jwt_secret() -> String {
    // Dev-only fallback; deployments must set URGENCE_JWT_SECRET.
    "urgence-dev-secret".to_string()
}

fn default_jwt_ttl_days() -> i64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            database_url: default_database_url(),
            db_max_connections: default_db_max_connections(),
            db_acquire_timeout_ms: default_db_acquire_timeout_ms(),
            jwt_secret: default_jwt_secret(),
            jwt_ttl_days: default_jwt_ttl_days(),
            push_gateway_url: None,
        }
    }
}

impl AppConfig {
    /// Resolve the configured bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// JSON dump of the configuration with secrets redacted, for startup
    /// logging.
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut redacted = self.clone();
        redacted.jwt_secret = "***".to_string();
        serde_json::to_string(&redacted)
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read env file {path}: {source}")]
    DotenvRead {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Loads [`AppConfig`] from layered `.env` files plus the process
/// environment.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads the configuration, process environment winning over files.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("URGENCE_") {
                layered.insert(stripped.to_string(), value);
            }
        }

        let profile = layered
            .remove("PROFILE")
            .filter(|v| !v.is_empty())
            .unwrap_or(profile_hint);
        let api_bind_addr = layered
            .remove("API_BIND_ADDR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_api_bind_addr);
        let log_level = layered
            .remove("LOG_LEVEL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_level);
        let log_format = layered
            .remove("LOG_FORMAT")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_log_format);
        let database_url = layered
            .remove("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_database_url);
        let db_max_connections = match layered.remove("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "URGENCE_DB_MAX_CONNECTIONS",
                value: raw,
            })?,
            None => default_db_max_connections(),
        };
        let db_acquire_timeout_ms = match layered.remove("DB_ACQUIRE_TIMEOUT_MS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "URGENCE_DB_ACQUIRE_TIMEOUT_MS",
                value: raw,
            })?,
            None => default_db_acquire_timeout_ms(),
        };
        let jwt_secret = layered
            .remove("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(default_jwt_secret);
        let jwt_ttl_days = match layered.remove("JWT_TTL_DAYS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "URGENCE_JWT_TTL_DAYS",
                value: raw,
            })?,
            None => default_jwt_ttl_days(),
        };
        let push_gateway_url = layered
            .remove("PUSH_GATEWAY_URL")
            .filter(|v| !v.is_empty());

        Ok(AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            database_url,
            db_max_connections,
            db_acquire_timeout_ms,
            jwt_secret,
            jwt_ttl_days,
            push_gateway_url,
        })
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("URGENCE_PROFILE")
            .ok()
            .or_else(|| values.get("PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) =
                        item.map_err(|source| ConfigError::DotenvRead {
                            path: path.clone(),
                            source,
                        })?;
                    if let Some(stripped) = key.strip_prefix("URGENCE_") {
                        values.insert(stripped.to_string(), value);
                    }
                }
                Ok(())
            }
            // A missing layer is not an error, anything else is.
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(source) => Err(ConfigError::DotenvRead { path, source }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = AppConfig::default();
        assert_eq!(config.profile, "dev");
        assert_eq!(config.api_bind_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.jwt_ttl_days, 30);
        assert!(config.push_gateway_url.is_none());
    }

    #[test]
    fn bind_addr_parses() {
        let config = AppConfig::default();
        let addr = config.bind_addr().unwrap();
        assert_eq!(addr.port(), 3000);

        let bad = AppConfig {
            api_bind_addr: "not-an-addr".to_string(),
            ..AppConfig::default()
        };
        assert!(bad.bind_addr().is_err());
    }

    #[test]
    fn redacted_json_hides_jwt_secret() {
        let config = AppConfig {
            jwt_secret: "super-secret".to_string(),
            ..AppConfig::default()
        };
        let json = config.redacted_json().unwrap();
        assert!(!json.contains("super-secret"));
        assert!(json.contains("***"));
    }

    #[test]
    fn layered_files_merge_with_prefix_stripped() {
        let dir = env::temp_dir().join(format!("urgence-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(".env"),
            "URGENCE_LOG_LEVEL=debug\nURGENCE_PUSH_GATEWAY_URL=http://gw.example\nIGNORED=1\n",
        )
        .unwrap();
        std::fs::write(dir.join(".env.local"), "URGENCE_LOG_LEVEL=trace\n").unwrap();

        let config = ConfigLoader::with_base_dir(dir.clone()).load().unwrap();
        assert_eq!(config.log_level, "trace");
        assert_eq!(
            config.push_gateway_url.as_deref(),
            Some("http://gw.example")
        );

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_env_files_are_fine() {
        let dir = env::temp_dir().join(format!("urgence-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let config = ConfigLoader::with_base_dir(dir.clone()).load();
        assert!(config.is_ok());
        std::fs::remove_dir_all(dir).ok();
    }
}

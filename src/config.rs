use std::path::PathBuf;
use std::str::FromStr;

use strum_macros::EnumString;
use thiserror::Error;

use crate::session::TokenConfig;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_DATA_FILE: &str = "quiniela-data.json";
const DEFAULT_JWT_SECRET: &str = "your-secret-key-change-in-production";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, EnumString)]
#[strum(ascii_case_insensitive)]
enum StorageKind {
    Memory,
    File,
    Postgres,
}

/// Where quinielas are persisted
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Memory,
    File(PathBuf),
    Postgres { database_url: String },
}

/// Process configuration, read from environment variables at startup
#[derive(Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub storage: StorageBackend,
    pub token: TokenConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address =
            lookup("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let storage = match lookup("STORAGE_BACKEND") {
            None => StorageBackend::Memory,
            Some(value) => match StorageKind::from_str(&value) {
                Ok(StorageKind::Memory) => StorageBackend::Memory,
                Ok(StorageKind::File) => StorageBackend::File(PathBuf::from(
                    lookup("QUINIELA_DATA_FILE").unwrap_or_else(|| DEFAULT_DATA_FILE.to_string()),
                )),
                Ok(StorageKind::Postgres) => StorageBackend::Postgres {
                    database_url: lookup("DATABASE_URL")
                        .ok_or(ConfigError::Missing("DATABASE_URL"))?,
                },
                Err(_) => {
                    return Err(ConfigError::Invalid {
                        var: "STORAGE_BACKEND",
                        value,
                    })
                }
            },
        };

        let secret = lookup("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());

        Ok(Self {
            bind_address,
            storage,
            token: TokenConfig::new(secret),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_in_memory_storage() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn file_backend_uses_configured_path() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "File"),
            ("QUINIELA_DATA_FILE", "/tmp/pools.json"),
        ])
        .unwrap();
        assert_eq!(
            config.storage,
            StorageBackend::File(PathBuf::from("/tmp/pools.json"))
        );
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let result = config_from(&[("STORAGE_BACKEND", "postgres")]);
        assert_eq!(result.err(), Some(ConfigError::Missing("DATABASE_URL")));

        let config = config_from(&[
            ("STORAGE_BACKEND", "postgres"),
            ("DATABASE_URL", "postgres://localhost/quiniela"),
        ])
        .unwrap();
        assert!(matches!(config.storage, StorageBackend::Postgres { .. }));
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(matches!(
            config_from(&[("STORAGE_BACKEND", "s3")]),
            Err(ConfigError::Invalid { var: "STORAGE_BACKEND", .. })
        ));
    }

    #[test]
    fn token_settings_only_carry_the_secret() {
        // Token lifetime belongs to the issuer, so a stray expiry variable is ignored
        let config = config_from(&[
            ("JWT_SECRET", "shared-secret"),
            ("SESSION_EXPIRATION_DAYS", "soon"),
        ])
        .unwrap();

        let issuer = TokenConfig::new("shared-secret".to_string());
        let token = issuer
            .create_token("ana", crate::session::Role::User, chrono::Duration::hours(1))
            .unwrap();
        assert_eq!(config.token.validate_token(&token).unwrap().user_id, "ana");
    }
}

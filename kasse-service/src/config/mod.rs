use kasse_core::{config::Config as CommonConfig, error::AppError};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KasseConfig {
    pub common: CommonConfig,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
}

impl KasseConfig {
    /// Load configuration from the environment on top of the common layer.
    /// Fails fast on a missing database URL.
    pub fn from_env() -> Result<Self, AppError> {
        let common = CommonConfig::load()?;

        Ok(Self {
            common,
            service_name: env_or("SERVICE_NAME", "kasse-service"),
            service_version: env_or("SERVICE_VERSION", env!("CARGO_PKG_VERSION")),
            log_level: env_or("LOG_LEVEL", "info"),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required but not set"))
                })?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", 1)?,
            },
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env(key: &str, default: u32) -> Result<u32, AppError> {
    match env::var(key) {
        Ok(val) => val.parse().map_err(|e: std::num::ParseIntError| {
            AppError::ConfigError(anyhow::anyhow!("{} must be an integer: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

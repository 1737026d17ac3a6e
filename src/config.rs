use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

/// Used when `JWT_SECRET` is not set. Anyone who knows it can mint tokens.
pub const FALLBACK_TOKEN_SECRET: &str = "default-secret-key";

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub token: TokenConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;

        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                warn!("JWT_SECRET is not set; falling back to the built-in secret");
                FALLBACK_TOKEN_SECRET.to_string()
            }
        };

        Ok(Self {
            database_url,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(8080),
            token: TokenConfig { secret },
        })
    }
}

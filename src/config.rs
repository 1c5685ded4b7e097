use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Longest accepted session lifetime (one year).
pub const MAX_JWT_TTL_HOURS: i64 = 24 * 366;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub max_page_size: i64,
    pub request_timeout: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `PORT`, `JWT_SECRET` and
    /// `DATABASE_URL` must be present and non-empty.
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            match var(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => anyhow::bail!("{key} is required"),
            }
        };

        let port_raw = required("PORT")?;
        // accept the ":8080" listen-address form as well as a bare number
        let port = port_raw
            .trim()
            .trim_start_matches(':')
            .parse::<u16>()
            .with_context(|| format!("PORT is not a valid port: {port_raw}"))?;

        let ttl_hours = var("JWT_TTL_HOURS")
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(24);
        if ttl_hours > MAX_JWT_TTL_HOURS {
            anyhow::bail!("JWT_TTL_HOURS must be at most {MAX_JWT_TTL_HOURS}, got {ttl_hours}");
        }
        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            ttl_hours,
        };

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database_url: required("DATABASE_URL")?,
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            max_page_size: var("MAX_PAGE_SIZE")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(100),
            request_timeout: var("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
        })
    }
}

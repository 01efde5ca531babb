use anyhow::{bail, Context, Result};
use std::env;

use crate::auth::{AccessPolicy, TokenConfig};

/// Longest token lifetime accepted from configuration (one year).
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_tls: bool,
    pub port: u16,
    pub token: TokenConfig,
    pub public_prefixes: Vec<String>,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `DATABASE_URL`: Postgres connection string
    /// - `JWT_SECRET`: Secret key for signing tokens
    pub fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.is_empty() {
            bail!("JWT_SECRET cannot be empty");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_tls: env::var("DATABASE_TLS")
                .map(|v| parse_bool(&v))
                .unwrap_or(Ok(true))
                .context("DATABASE_TLS must be true or false")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            token: TokenConfig {
                jwt_secret,
                token_ttl_hours: parse_ttl_hours(
                    &env::var("TOKEN_TTL_HOURS").unwrap_or_else(|_| "24".to_string()),
                )?,
                issuer: env::var("TOKEN_ISSUER").unwrap_or_else(|_| "vault-api".to_string()),
            },
            public_prefixes: env::var("PUBLIC_PATH_PREFIXES")
                .map(|v| split_list(&v))
                .unwrap_or_else(|_| vec!["/public/".to_string()]),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|v| split_list(&v)),
        })
    }

    /// Access rules for the API router.
    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy {
            public_prefixes: self.public_prefixes.clone(),
            ..AccessPolicy::default()
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_ttl_hours(value: &str) -> Result<i64> {
    let hours: i64 = value
        .trim()
        .parse()
        .context("TOKEN_TTL_HOURS must be a valid number")?;
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        bail!(
            "TOKEN_TTL_HOURS must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_HOURS,
            hours
        );
    }
    Ok(hours)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("unrecognized boolean {:?}", other),
    }
}

use crate::constants::*;
use std::env;
use thiserror::Error;
use time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: String,
    pub data_path: String,
    pub token_secret: String,
    pub token_ttl: Duration,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET environment variable is required")]
    MissingTokenSecret,
    #[error("Invalid token secret: must be at least {} bytes long", MIN_TOKEN_SECRET_LENGTH)]
    InvalidTokenSecret,
    #[error("Invalid port number: {0}")]
    InvalidPort(String),
    #[error("Invalid token lifetime: {0}")]
    InvalidTokenTtl(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, so tests never
    /// have to touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup("SERVER_PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let data_path = lookup("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());

        if port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidPort(port));
        }

        let token_secret = lookup("JWT_SECRET").ok_or(ConfigError::MissingTokenSecret)?;
        if token_secret.len() < MIN_TOKEN_SECRET_LENGTH {
            return Err(ConfigError::InvalidTokenSecret);
        }

        let ttl_raw = lookup("JWT_EXPIRES_IN").unwrap_or_else(|| DEFAULT_TOKEN_TTL.to_string());
        let token_ttl =
            parse_ttl(&ttl_raw).ok_or_else(|| ConfigError::InvalidTokenTtl(ttl_raw.clone()))?;

        Ok(Config {
            host,
            port,
            data_path,
            token_secret,
            token_ttl,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses `30s`, `15m`, `12h`, `7d` or a bare number of seconds. Lifetimes
/// above `MAX_TOKEN_TTL_DAYS` are rejected.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last()? {
        (idx, c) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c.to_ascii_lowercase())),
        _ => (raw, None),
    };
    let value: i64 = digits.parse().ok().filter(|v| *v > 0)?;

    let unit_seconds: i64 = match unit {
        None | Some('s') => 1,
        Some('m') => 60,
        Some('h') => 3_600,
        Some('d') => 86_400,
        Some(_) => return None,
    };
    let seconds = value
        .checked_mul(unit_seconds)
        .filter(|s| *s <= MAX_TOKEN_TTL_DAYS * 86_400)?;
    Some(Duration::seconds(seconds))
}

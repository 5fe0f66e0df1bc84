//! Centralized configuration for the bearer token service.
//!
//! Loaded from environment variables (optionally via `.env`) and validated
//! at startup. The signing secret is never part of configuration: it is
//! generated in-process by [`crate::jwt::KeyMaterial::generate`].

use crate::error::TokenError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// JWT signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwtAlgorithm {
    /// HMAC with SHA-256
    HS256,
}

impl JwtAlgorithm {
    /// Get algorithm name for JWT header.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
        }
    }
}

impl FromStr for JwtAlgorithm {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HS256" => Ok(Self::HS256),
            _ => Err(TokenError::config(format!("Unsupported JWT algorithm: {s}"))),
        }
    }
}

/// Bearer token service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service name reported in logs
    pub service_name: String,

    // Token settings
    /// Default token TTL
    pub token_ttl: Duration,
    /// JWT signing algorithm
    pub jwt_algorithm: JwtAlgorithm,

    // Logging
    /// Log level filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "bearer-token-service".to_string(),
            token_ttl: Duration::from_secs(3600),
            jwt_algorithm: JwtAlgorithm::HS256,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TokenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let service_name = lookup("SERVICE_NAME").unwrap_or(defaults.service_name);

        let ttl_secs: u64 = parse_var(&lookup, "TOKEN_TTL_SECONDS", defaults.token_ttl.as_secs())?;
        if ttl_secs == 0 {
            return Err(TokenError::config("TOKEN_TTL_SECONDS must be positive"));
        }

        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(alg) => alg.parse()?,
            None => defaults.jwt_algorithm,
        };

        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);
        let log_json = parse_var(&lookup, "LOG_JSON", defaults.log_json)?;

        Ok(Self {
            service_name,
            token_ttl: Duration::from_secs(ttl_secs),
            jwt_algorithm,
            log_level,
            log_json,
        })
    }
}

/// Parse a variable with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, TokenError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {name}: {e}"))),
        None => Ok(default),
    }
}

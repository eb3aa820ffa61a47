// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`AppConfig`] value built from them once at startup. The config is passed
//! explicitly into the services that need it; nothing reads the environment
//! after `main` has built it.
//!
//! `main` calls [`load_env_file`] before anything else reads the environment,
//! so logging settings in `.env` are honoured too.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | Access token signing secret | Required |
//! | `JWT_ALGORITHM` | Access token algorithm (`HS256`, `HS384`, `HS512`) | `HS256` |
//! | `JWT_EXPIRATION` | Access token lifetime in seconds | Required |
//! | `JWT_REFRESH_SECRET` | Refresh token signing secret | Required |
//! | `JWT_REFRESH_ALGORITHM` | Refresh token algorithm | `HS256` |
//! | `JWT_REFRESH_EXPIRATION` | Refresh token lifetime in seconds | Required |
//! | `APP_URL` | Token issuer and audience | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `BASE_PATH` | Prefix all routes are mounted under | none |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated allowed origins | permissive |
//! | `RESET_TOKEN_TTL_SECONDS` | Password-reset token lifetime | `3600` |
//! | `PASSWORD_HASH_MEMORY_KIB` | Argon2 memory cost | `19456` |
//! | `PASSWORD_HASH_ITERATIONS` | Argon2 time cost | `2` |
//! | `PASSWORD_HASH_PARALLELISM` | Argon2 lanes | `1` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ALGORITHM_ENV: &str = "JWT_ALGORITHM";
pub const JWT_EXPIRATION_ENV: &str = "JWT_EXPIRATION";
pub const JWT_REFRESH_SECRET_ENV: &str = "JWT_REFRESH_SECRET";
pub const JWT_REFRESH_ALGORITHM_ENV: &str = "JWT_REFRESH_ALGORITHM";
pub const JWT_REFRESH_EXPIRATION_ENV: &str = "JWT_REFRESH_EXPIRATION";
pub const APP_URL_ENV: &str = "APP_URL";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const BASE_PATH_ENV: &str = "BASE_PATH";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const RESET_TOKEN_TTL_ENV: &str = "RESET_TOKEN_TTL_SECONDS";
pub const PASSWORD_HASH_MEMORY_ENV: &str = "PASSWORD_HASH_MEMORY_KIB";
pub const PASSWORD_HASH_ITERATIONS_ENV: &str = "PASSWORD_HASH_ITERATIONS";
pub const PASSWORD_HASH_PARALLELISM_ENV: &str = "PASSWORD_HASH_PARALLELISM";

/// Environment variable selecting `json` or `pretty` log output.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_ALGORITHM: Algorithm = Algorithm::HS256;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 3600;

/// Upper bound for every configured lifetime: ten years.
pub const MAX_LIFETIME_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

/// Startup configuration failure. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Secret, algorithm and lifetime of one token class.
#[derive(Clone)]
pub struct TokenClassConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub expiry_seconds: i64,
}

impl std::fmt::Debug for TokenClassConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenClassConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("expiry_seconds", &self.expiry_seconds)
            .finish()
    }
}

/// Signing material for both token classes plus the service identity
/// pinned into `iss` and `aud`.
#[derive(Debug, Clone)]
pub struct SigningConfig {
    pub access: TokenClassConfig,
    pub refresh: TokenClassConfig,
    pub issuer: String,
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub signing: SigningConfig,
    pub password_hash: PasswordHashConfig,
    pub host: String,
    pub port: u16,
    /// Prefix such as `/api`; `None` mounts routes at the root.
    pub base_path: Option<String>,
    /// `None` means any origin is accepted.
    pub cors_allowed_origins: Option<Vec<String>>,
    pub reset_token_ttl_seconds: i64,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let access = TokenClassConfig {
            secret: require(JWT_SECRET_ENV)?,
            algorithm: parse_algorithm(JWT_ALGORITHM_ENV, get(JWT_ALGORITHM_ENV))?,
            expiry_seconds: parse_lifetime(JWT_EXPIRATION_ENV, &require(JWT_EXPIRATION_ENV)?)?,
        };
        let refresh = TokenClassConfig {
            secret: require(JWT_REFRESH_SECRET_ENV)?,
            algorithm: parse_algorithm(JWT_REFRESH_ALGORITHM_ENV, get(JWT_REFRESH_ALGORITHM_ENV))?,
            expiry_seconds: parse_lifetime(
                JWT_REFRESH_EXPIRATION_ENV,
                &require(JWT_REFRESH_EXPIRATION_ENV)?,
            )?,
        };

        if access.secret == refresh.secret {
            return Err(ConfigError::Invalid {
                key: JWT_REFRESH_SECRET_ENV,
                reason: format!("must differ from {JWT_SECRET_ENV}"),
            });
        }

        let signing = SigningConfig {
            access,
            refresh,
            issuer: require(APP_URL_ENV)?,
        };

        let defaults = PasswordHashConfig::default();
        let password_hash = PasswordHashConfig {
            memory_kib: parse_or(PASSWORD_HASH_MEMORY_ENV, get(PASSWORD_HASH_MEMORY_ENV), defaults.memory_kib)?,
            iterations: parse_or(
                PASSWORD_HASH_ITERATIONS_ENV,
                get(PASSWORD_HASH_ITERATIONS_ENV),
                defaults.iterations,
            )?,
            parallelism: parse_or(
                PASSWORD_HASH_PARALLELISM_ENV,
                get(PASSWORD_HASH_PARALLELISM_ENV),
                defaults.parallelism,
            )?,
        };

        let base_path = get(BASE_PATH_ENV)
            .map(|p| format!("/{}", p.trim().trim_matches('/')))
            .filter(|p| p != "/");

        let cors_allowed_origins = get(CORS_ALLOWED_ORIGINS_ENV).map(|origins| {
            origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        });

        let reset_token_ttl_seconds = match get(RESET_TOKEN_TTL_ENV) {
            Some(raw) => parse_lifetime(RESET_TOKEN_TTL_ENV, &raw)?,
            None => DEFAULT_RESET_TOKEN_TTL_SECONDS,
        };

        Ok(Self {
            signing,
            password_hash,
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(PORT_ENV, get(PORT_ENV), DEFAULT_PORT)?,
            base_path,
            cors_allowed_origins,
            reset_token_ttl_seconds,
        })
    }
}

/// Read `.env` from the working directory or its parents into the process
/// environment. Variables already set win. A missing file is normal in
/// containers.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Read a specific env file into the process environment.
pub fn load_env_file_from(path: &Path) -> Result<(), dotenvy::Error> {
    dotenvy::from_path(path)
}

fn parse_algorithm(key: &'static str, raw: Option<String>) -> Result<Algorithm, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_ALGORITHM);
    };

    let algorithm = Algorithm::from_str(raw.trim()).map_err(|_| ConfigError::Invalid {
        key,
        reason: format!("unknown algorithm '{raw}'"),
    })?;

    // Secrets are shared strings, so only the HMAC family applies.
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("{other:?} needs a key pair; use HS256, HS384 or HS512"),
        }),
    }
}

fn parse_lifetime(key: &'static str, raw: &str) -> Result<i64, ConfigError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value <= 0 => Err(ConfigError::Invalid {
            key,
            reason: "must be positive".to_string(),
        }),
        Ok(value) if value > MAX_LIFETIME_SECONDS => Err(ConfigError::Invalid {
            key,
            reason: format!("must not exceed {MAX_LIFETIME_SECONDS} seconds"),
        }),
        Ok(value) => Ok(value),
        Err(e) => Err(ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

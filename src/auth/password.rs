// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Password hashing and credential verification.
//!
//! Passwords are stored as Argon2id PHC strings. Hashing and verification are
//! CPU-heavy, so [`CredentialVerifier`] moves them onto the blocking pool.

use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;
use tracing::warn;

use crate::config::PasswordHashConfig;

/// Password used to build the dummy hash for unknown accounts.
const DUMMY_PASSWORD: &str = "dummy-password-for-timing-parity";

/// One-way password hash. Never serialized, redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a hash read from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid hashing parameters: {0}")]
    Params(argon2::Error),
    #[error("failed to hash password: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// One-way password hashing collaborator.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<Credential, HashError>;
    fn verify(&self, plaintext: &str, credential: &Credential) -> bool;
}

/// Argon2id hasher with configurable cost.
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(config: PasswordHashConfig) -> Result<Self, HashError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(HashError::Params)?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<Credential, HashError> {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(HashError::Hash)?;
        Ok(Credential(hash.to_string()))
    }

    fn verify(&self, plaintext: &str, credential: &Credential) -> bool {
        let hash = match PasswordHash::new(credential.as_str()) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(?err, "invalid stored password hash");
                return false;
            }
        };

        // Cost parameters are read from the PHC string.
        match self.argon2().verify_password(plaintext.as_bytes(), &hash) {
            Ok(()) => true,
            Err(argon2::password_hash::Error::Password) => false,
            Err(err) => {
                warn!(?err, "failed to verify password hash");
                false
            }
        }
    }
}

/// Verifies login secrets and produces new credentials.
///
/// Holds a dummy credential so that a login for an unknown account costs the
/// same as a login with a wrong password.
#[derive(Clone)]
pub struct CredentialVerifier {
    hasher: Arc<dyn PasswordHasher>,
    dummy: Credential,
}

impl CredentialVerifier {
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Result<Self, HashError> {
        let dummy = hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self { hasher, dummy })
    }

    /// Build an Argon2id verifier from configuration.
    pub fn argon2(config: PasswordHashConfig) -> Result<Self, HashError> {
        Self::new(Arc::new(Argon2Hasher::new(config)?))
    }

    /// Check `plaintext` against a stored credential.
    ///
    /// Pass `None` when the account does not exist; the dummy credential is
    /// checked instead and the result is always `false`.
    pub async fn verify(&self, plaintext: String, stored: Option<Credential>) -> bool {
        let known = stored.is_some();
        let credential = stored.unwrap_or_else(|| self.dummy.clone());
        let hasher = Arc::clone(&self.hasher);

        let verified = tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &credential))
            .await
            .unwrap_or_else(|err| {
                warn!(?err, "failed to join password verification");
                false
            });

        known && verified
    }

    /// Hash a new password. The plaintext is dropped on the blocking pool.
    pub async fn hash(&self, plaintext: String) -> Result<Credential, HashError> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext)).await?
    }
}

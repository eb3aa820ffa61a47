// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token issuance and validation.
//!
//! Two token classes are minted:
//!
//! - **access**: short-lived, authorizes individual API calls
//! - **refresh**: longer-lived, only exchanged for a new pair
//!
//! Each class has its own secret and algorithm. Validation collapses every
//! failure (malformed, bad signature, wrong class, expired, not yet valid,
//! foreign issuer) into [`InvalidToken`] so responses cannot be used as an
//! oracle. The concrete reason is logged at debug level.
//!
//! Tokens are stateless: nothing is stored server-side and a refresh does not
//! invalidate the refresh token it consumed.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::claims::{ClaimsData, TokenClaims, TokenType};
use crate::config::{SigningConfig, TokenClassConfig};
use crate::models::{PrincipalId, User};
use crate::storage::UserDirectory;

/// Claims a token must carry to be considered at all. A missing subject is
/// left to the payload check so it reports as an unusable payload.
const REQUIRED_CLAIMS: [&str; 5] = ["exp", "nbf", "iat", "iss", "aud"];

/// Token could not be signed. Only reachable through bad configuration.
#[derive(Debug, Error)]
pub enum TokenSigningError {
    #[error("failed to sign token: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
    #[error("token expiry overflows the clock")]
    ExpiryOverflow,
}

/// Token failed validation. Deliberately carries no reason.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

/// Outcome of a failed refresh.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("invalid refresh token")]
    Invalid(#[from] InvalidToken),
    #[error("principal not found")]
    PrincipalNotFound,
    #[error(transparent)]
    Signing(#[from] TokenSigningError),
}

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    expiry_seconds: i64,
}

impl TokenKeys {
    fn new(config: &TokenClassConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            algorithm: config.algorithm,
            expiry_seconds: config.expiry_seconds,
        }
    }
}

/// Issues and validates signed claim sets for both token classes.
///
/// Built once at startup from [`SigningConfig`] and shared read-only.
pub struct TokenService {
    access: TokenKeys,
    refresh: TokenKeys,
    issuer: String,
}

impl TokenService {
    pub fn new(config: &SigningConfig) -> Self {
        Self {
            access: TokenKeys::new(&config.access),
            refresh: TokenKeys::new(&config.refresh),
            issuer: config.issuer.clone(),
        }
    }

    /// Mint an access token for `principal_id`.
    pub fn issue_access_token(&self, principal_id: PrincipalId) -> Result<String, TokenSigningError> {
        self.issue_at(TokenType::Access, principal_id, Utc::now().timestamp())
    }

    /// Mint a refresh token for `principal_id`.
    pub fn issue_refresh_token(&self, principal_id: PrincipalId) -> Result<String, TokenSigningError> {
        self.issue_at(TokenType::Refresh, principal_id, Utc::now().timestamp())
    }

    /// Mint an access and a refresh token together.
    pub fn issue_pair(&self, principal_id: PrincipalId) -> Result<TokenPair, TokenSigningError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(principal_id)?,
            refresh_token: self.issue_refresh_token(principal_id)?,
        })
    }

    /// Validate an access token.
    pub fn validate_access_token(&self, token: &str) -> Result<TokenClaims, InvalidToken> {
        self.validate(token, TokenType::Access)
    }

    /// Validate a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> Result<TokenClaims, InvalidToken> {
        self.validate(token, TokenType::Refresh)
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The directory lookup is the only I/O. A missing principal is final,
    /// not retried. Returns the resolved user alongside the pair.
    pub fn refresh<D>(&self, refresh_token: &str, directory: &D) -> Result<(TokenPair, User), RefreshError>
    where
        D: UserDirectory + ?Sized,
    {
        let claims = self.validate_refresh_token(refresh_token)?;
        let principal_id = claims.principal_id().ok_or(InvalidToken)?;

        let user = directory
            .find_by_id(principal_id)
            .ok_or(RefreshError::PrincipalNotFound)?;

        let pair = self.issue_pair(user.id)?;
        Ok((pair, user))
    }

    pub(crate) fn issue_at(
        &self,
        token_type: TokenType,
        principal_id: PrincipalId,
        issued_at: i64,
    ) -> Result<String, TokenSigningError> {
        let keys = self.keys(token_type);
        let exp = issued_at
            .checked_add(keys.expiry_seconds)
            .ok_or(TokenSigningError::ExpiryOverflow)?;
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            aud: self.issuer.clone(),
            sub: principal_id.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp,
            token_type,
            data: ClaimsData {
                auth_id: Some(principal_id),
            },
            jti: Uuid::new_v4().to_string(),
        };

        Ok(encode(&Header::new(keys.algorithm), &claims, &keys.encoding)?)
    }

    fn keys(&self, token_type: TokenType) -> &TokenKeys {
        match token_type {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<TokenClaims, InvalidToken> {
        let keys = self.keys(expected);

        let mut validation = Validation::new(keys.algorithm);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.issuer]);
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);

        let claims = decode::<TokenClaims>(token, &keys.decoding, &validation)
            .map_err(|e| {
                debug!(token_type = %expected, reason = ?e.kind(), "token rejected");
                InvalidToken
            })?
            .claims;

        if claims.token_type != expected {
            debug!(token_type = %expected, presented = %claims.token_type, "token class mismatch");
            return Err(InvalidToken);
        }

        let now = Utc::now().timestamp();
        if claims.exp <= claims.iat || now < claims.nbf || now > claims.exp {
            debug!(token_type = %expected, "token outside its validity window");
            return Err(InvalidToken);
        }

        Ok(claims)
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token claims and authenticated user representation.

use serde::{Deserialize, Serialize};

use crate::models::PrincipalId;

/// Discriminator separating the two token classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Opaque data blob carried by every token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsData {
    #[serde(default)]
    pub auth_id: Option<PrincipalId>,
}

/// Signed payload of an access or refresh token.
///
/// Decoded once by the token service; downstream code reads typed fields
/// only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer (service identity)
    pub iss: String,
    /// Audience (service identity)
    pub aud: String,
    /// Subject: principal id as a decimal string. Empty when absent.
    #[serde(default)]
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Not before (unix seconds)
    pub nbf: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Token class
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default)]
    pub data: ClaimsData,
    /// Unique token id
    pub jti: String,
}

impl TokenClaims {
    /// Principal the token was minted for.
    ///
    /// Requires `sub` and `data.auth_id` to both be present and agree, and
    /// the id to be positive.
    pub fn principal_id(&self) -> Option<PrincipalId> {
        let from_sub = self.sub.parse::<PrincipalId>().ok()?;
        match self.data.auth_id {
            Some(auth_id) if auth_id == from_sub && auth_id.0 > 0 => Some(auth_id),
            _ => None,
        }
    }
}

/// Authenticated principal attached to a request by the auth gate.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub principal_id: PrincipalId,
    /// Raw claims of the access token that authorized the request.
    pub claims: TokenClaims,
}

impl AuthenticatedUser {
    /// Build from validated claims; `None` when the claims name no principal.
    pub fn from_claims(claims: TokenClaims) -> Option<Self> {
        let principal_id = claims.principal_id()?;
        Some(Self {
            principal_id,
            claims,
        })
    }
}

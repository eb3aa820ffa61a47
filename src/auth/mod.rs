// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless token authentication for the shopping-list API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with email and password (`POST /auth/login`)
//! 2. Server verifies the Argon2id credential and returns an access token
//!    and a refresh token
//! 3. Client sends `Authorization: Bearer <access token>` on protected routes
//! 4. The auth gate verifies signature, class, issuer, audience and validity
//!    window, then attaches the principal id to the request
//! 5. When the access token expires, the client exchanges its refresh token
//!    for a new pair (`POST /auth/refresh-token`)
//!
//! ## Security
//!
//! - Access and refresh tokens use distinct secrets
//! - Token failures are never distinguished to the client
//! - Unknown email and wrong password return the same response
//! - No clock-skew leeway on expiry

pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod password;
pub mod roles;
pub mod tokens;

pub use claims::{AuthenticatedUser, TokenClaims, TokenType};
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::auth_gate;
pub use password::{Argon2Hasher, Credential, CredentialVerifier, HashError, PasswordHasher};
pub use roles::Role;
pub use tokens::{InvalidToken, RefreshError, TokenPair, TokenService, TokenSigningError};

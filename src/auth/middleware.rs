// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! The auth gate is applied to the protected route group with
//! `axum::middleware::from_fn_with_state`. For each request it walks:
//!
//! 1. header missing or empty → `HeaderMissing`
//! 2. header not `Bearer <token>` → `HeaderMalformed`
//! 3. token blank after trimming → `TokenMissing`
//! 4. access token fails validation → `TokenInvalid`
//! 5. claims name no principal → `PayloadInvalid`
//! 6. otherwise the [`AuthenticatedUser`] is inserted into the request
//!    extensions and the request is forwarded
//!
//! The gate never touches storage.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::{AuthError, AuthenticatedUser, TokenService};
use crate::state::AppState;

const BEARER_SCHEME: &str = "Bearer";

/// Extract the bearer token from request headers.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(AuthError::HeaderMissing);
    };
    if value.is_empty() {
        return Err(AuthError::HeaderMissing);
    }

    let header = value.to_str().map_err(|_| AuthError::HeaderMalformed)?;

    // Case-sensitive scheme, at least one whitespace, then at least one
    // more character.
    let rest = header
        .strip_prefix(BEARER_SCHEME)
        .ok_or(AuthError::HeaderMalformed)?;
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some(sep), Some(_)) if sep.is_whitespace() => {}
        _ => return Err(AuthError::HeaderMalformed),
    }

    let token = rest.trim();
    if token.is_empty() {
        return Err(AuthError::TokenMissing);
    }

    Ok(token)
}

/// Run the full gate against request headers.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;

    let claims = tokens
        .validate_access_token(token)
        .map_err(|_| AuthError::TokenInvalid)?;

    AuthenticatedUser::from_claims(claims).ok_or(AuthError::PayloadInvalid)
}

/// Authentication middleware function.
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authenticate(request.headers(), &state.tokens) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            debug!(path = %request.uri().path(), reason = %e, "request rejected by auth gate");
            e.into_response()
        }
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! Use the `Auth` extractor in handlers to get the principal:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user.principal_id is the authenticated principal
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{middleware::authenticate, AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Reads the principal the auth gate attached to the request. When a handler
/// is mounted outside the gated group, the same checks run here instead, so
/// a handler taking `Auth` is never reached without a valid access token.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        let user = authenticate(&parts.headers, &state.tokens)?;
        parts.extensions.insert(user.clone());
        Ok(Auth(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PrincipalId;
    use crate::state::tests::test_state;

    fn parts(authorization: Option<String>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/shopping-lists");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let mut parts = parts(None);
        let result = Auth::from_request_parts(&mut parts, &test_state()).await;
        assert!(matches!(result, Err(AuthError::HeaderMissing)));
    }

    #[tokio::test]
    async fn validates_token_when_gate_did_not_run() {
        let state = test_state();
        let token = state.tokens.issue_access_token(PrincipalId(12)).unwrap();
        let mut parts = parts(Some(format!("Bearer {token}")));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.principal_id, PrincipalId(12));
        assert!(parts.extensions.get::<AuthenticatedUser>().is_some());
    }

    #[tokio::test]
    async fn principal_from_gate_wins_over_header() {
        let state = test_state();
        let token = state.tokens.issue_access_token(PrincipalId(77)).unwrap();
        let claims = state.tokens.validate_access_token(&token).unwrap();
        let mut parts = parts(Some("Bearer ignored".to_string()));
        parts
            .extensions
            .insert(AuthenticatedUser::from_claims(claims).unwrap());

        let Auth(user) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(user.principal_id, PrincipalId(77));
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let state = test_state();
        let token = state.tokens.issue_refresh_token(PrincipalId(12)).unwrap();
        let mut parts = parts(Some(format!("Bearer {token}")));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::TokenInvalid)));
    }
}

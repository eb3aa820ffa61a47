// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// Rejection produced by the auth gate.
///
/// Every variant maps to 401 with the same body shape; only the text
/// differs. Token problems of any kind are reported as [`TokenInvalid`]
/// without further detail.
///
/// [`TokenInvalid`]: AuthError::TokenInvalid
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header missing")]
    HeaderMissing,
    /// Header is not `Bearer <token>`
    #[error("Invalid authorization header format")]
    HeaderMalformed,
    /// Bearer scheme present but the token is blank
    #[error("Access token missing")]
    TokenMissing,
    /// Malformed, forged, expired, or wrong-class token
    #[error("Invalid or expired access token")]
    TokenInvalid,
    /// Token verified but names no usable principal
    #[error("Invalid token payload")]
    PayloadInvalid,
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    error: String,
    timestamp: String,
}

impl AuthError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(AuthErrorBody {
            success: false,
            error: self.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        });
        (self.status_code(), body).into_response()
    }
}

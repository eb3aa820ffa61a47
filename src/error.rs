// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP error type and the outermost error boundary.
//!
//! Every non-auth failure leaves the process as
//! `{"success":false,"message":...,"errors"?:...,"timestamp":...}`.
//! Internal details (panic payloads, source errors) are logged and replaced
//! by a generic message.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Display;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{debug, error};

use crate::auth::{HashError, TokenSigningError};
use crate::storage::StorageError;

pub const ROUTE_NOT_FOUND_MESSAGE: &str = "Route not found.";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed for this route.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred.";

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
    timestamp: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Validation failure carrying per-field detail.
    pub fn validation(status: StatusCode, errors: FieldErrors) -> Self {
        Self {
            status,
            message: "Validation failed.".to_string(),
            errors: Some(errors),
        }
    }

    /// Log `source` and answer with the generic 500.
    pub fn internal(source: impl Display) -> Self {
        error!(error = %source, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            message: self.message,
            errors: self.errors,
            timestamp: Utc::now().to_rfc3339(),
        });
        (self.status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => ApiError::not_found(format!("{what} not found.")),
            // Callers handle the conflicts they expect.
            StorageError::Conflict(_) => ApiError::internal(err),
        }
    }
}

impl From<HashError> for ApiError {
    fn from(err: HashError) -> Self {
        ApiError::internal(err)
    }
}

impl From<TokenSigningError> for ApiError {
    fn from(err: TokenSigningError) -> Self {
        ApiError::internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(reason = %rejection.body_text(), "rejected request body");
        ApiError::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        debug!(reason = %rejection.body_text(), "rejected path parameters");
        ApiError::bad_request("Invalid path parameter.")
    }
}

/// `axum::Json` with rejections rendered as [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with rejections rendered as [`ApiError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

// =============================================================================
// Error Boundary
// =============================================================================

/// Fallback for requests that match no route.
pub async fn route_not_found() -> ApiError {
    ApiError::not_found(ROUTE_NOT_FOUND_MESSAGE)
}

/// Fallback for a known path hit with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
}

/// Turn a caught panic into the generic 500. The payload is logged only.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };
    error!(panic = %detail, "request handler panicked");

    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE).into_response()
}

/// Install the 404 and 405 fallbacks. Must run after every route has been
/// added and before any `layer` call.
pub fn with_fallbacks(router: Router) -> Router {
    router
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
}

/// Outermost layer: a panic anywhere below becomes the generic 500 and the
/// server keeps running.
pub fn catch_panics(router: Router) -> Router {
    router.layer(CatchPanicLayer::custom(handle_panic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        routing::get,
    };
    use tower::ServiceExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let internal = ApiError::internal("disk on fire");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, INTERNAL_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn into_response_returns_envelope() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "bad data");
        assert!(body.get("errors").is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn validation_errors_are_listed_per_field() {
        let mut errors = FieldErrors::new();
        errors.insert("name".to_string(), vec!["The name field is required.".to_string()]);

        let response = ApiError::validation(StatusCode::UNPROCESSABLE_ENTITY, errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["errors"]["name"][0], "The name field is required.");
    }

    #[test]
    fn storage_errors_map_to_status() {
        let nf: ApiError = StorageError::NotFound("Shopping list 4".to_string()).into();
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "Shopping list 4 not found.");

        let conflict: ApiError =
            StorageError::Conflict(crate::storage::UniqueField::Email).into();
        assert_eq!(conflict.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(conflict.message, INTERNAL_ERROR_MESSAGE);
    }

    fn boundary_app() -> Router {
        let app = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route(
                "/boom",
                get(|| async {
                    if true {
                        panic!("secret panic detail");
                    }
                    "unreachable"
                }),
            )
            .route(
                "/echo",
                axum::routing::post(|ApiJson(value): ApiJson<serde_json::Value>| async move {
                    Json(value)
                }),
            )
            .route(
                "/items/{id}",
                get(|ApiPath(id): ApiPath<u64>| async move { id.to_string() }),
            );
        catch_panics(with_fallbacks(app))
    }

    #[tokio::test]
    async fn unknown_route_is_404_envelope() {
        let response = boundary_app()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], ROUTE_NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn wrong_method_is_405_envelope() {
        let response = boundary_app()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/ok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_eq!(body["message"], METHOD_NOT_ALLOWED_MESSAGE);
    }

    #[tokio::test]
    async fn panic_becomes_generic_500_without_detail() {
        let app = boundary_app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("secret panic detail"));
        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], INTERNAL_ERROR_MESSAGE);

        // The app keeps serving after a panic.
        let response = app
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_is_400_envelope() {
        let response = boundary_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn bad_path_parameter_is_400_envelope() {
        let response = boundary_app()
            .oneshot(Request::builder().uri("/items/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Invalid path parameter.");
    }
}

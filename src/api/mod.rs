// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::auth_gate,
    error::{catch_panics, with_fallbacks},
    models::{
        ListItem, ListItemRequest, LoginRequest, LoginResponse, LoginUser, RefreshResponse,
        RefreshTokenRequest, RegisterRequest, ResetLinkRequest, ResetPasswordRequest,
        ShoppingList, ShoppingListRequest, UserProfile, ValidateResetTokenRequest,
    },
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod items;
pub mod lists;

/// Success envelope: `{"success":true,"data":...,"message"?:...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Success without a payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = build_cors_layer(state.config.cors_allowed_origins.as_deref());

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/reset-link", post(auth::reset_link))
        .route("/auth/validate-reset-token", post(auth::validate_reset_token))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    let protected_routes = Router::new()
        .route("/check-auth", post(auth::check_auth))
        .route(
            "/shopping-lists",
            get(lists::list_shopping_lists).post(lists::create_shopping_list),
        )
        .route(
            "/shopping-lists/{id}",
            get(lists::get_shopping_list)
                .put(lists::update_shopping_list)
                .delete(lists::delete_shopping_list),
        )
        .route(
            "/shopping-lists/{id}/restore",
            post(lists::restore_shopping_list),
        )
        .route(
            "/shopping-lists/{id}/items",
            get(items::list_items).post(items::create_item),
        )
        .route(
            "/shopping-lists/{id}/items/{item_id}",
            put(items::update_item).delete(items::delete_item),
        )
        .route(
            "/shopping-lists/{id}/items/{item_id}/toggle",
            patch(items::toggle_item),
        )
        .route(
            "/shopping-lists/{id}/items/{item_id}/restore",
            post(items::restore_item),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_gate));

    let api_routes = public_routes
        .merge(protected_routes)
        .with_state(state.clone());

    let app = match &state.config.base_path {
        Some(base_path) => Router::new().nest(base_path, api_routes),
        None => api_routes,
    }
    .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()));

    let app = with_fallbacks(app)
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(trace_layer)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    catch_panics(app)
}

/// Permissive when no origins are configured, otherwise an exact allow-list.
fn build_cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(allowed_origins) = allowed_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                warn!(%origin, "CORS: ignoring invalid origin");
                None
            })
        })
        .collect();

    if origins.is_empty() {
        warn!("CORS: no valid origins configured, denying cross-origin requests");
        return CorsLayer::new().allow_origin(AllowOrigin::exact(HeaderValue::from_static("null")));
    }

    info!(count = origins.len(), "CORS: allowing configured origins");
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::refresh_token,
        auth::reset_link,
        auth::validate_reset_token,
        auth::reset_password,
        auth::check_auth,
        lists::list_shopping_lists,
        lists::create_shopping_list,
        lists::get_shopping_list,
        lists::update_shopping_list,
        lists::delete_shopping_list,
        lists::restore_shopping_list,
        items::list_items,
        items::create_item,
        items::update_item,
        items::delete_item,
        items::toggle_item,
        items::restore_item,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            LoginUser,
            RefreshTokenRequest,
            RefreshResponse,
            ResetLinkRequest,
            ValidateResetTokenRequest,
            ResetPasswordRequest,
            UserProfile,
            ShoppingList,
            ShoppingListRequest,
            ListItem,
            ListItemRequest,
            MessageResponse,
            health::HealthResponse,
            health::ReadyResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login, tokens and password reset"),
        (name = "Shopping Lists", description = "Owner-scoped shopping lists"),
        (name = "Items", description = "Items inside a shopping list"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;

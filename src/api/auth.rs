// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication endpoints.
//!
//! Registration, login, token refresh and the password-reset flow are
//! public. `check-auth` sits behind the auth gate.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use rand::{Rng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::{ApiResponse, MessageResponse};
use crate::{
    auth::{Auth, RefreshError},
    error::{ApiError, ApiJson, FieldErrors},
    models::{
        LoginRequest, LoginResponse, LoginUser, NewUser, RefreshResponse, RefreshTokenRequest,
        RegisterRequest, ResetLinkRequest, ResetPasswordRequest, User, UserProfile,
        ValidateResetTokenRequest,
    },
    state::AppState,
    storage::{StorageError, UniqueField, UserDirectory, MAX_UNIQUE_ATTEMPTS},
    validation::{normalize_email, validate_login, validate_new_password, validate_register, Validator},
};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials.";
pub const REFRESH_TOKEN_MISSING_MESSAGE: &str = "Refresh token missing";
pub const INVALID_REFRESH_TOKEN_MESSAGE: &str = "Invalid or expired refresh token";
pub const INVALID_RESET_TOKEN_MESSAGE: &str = "Invalid or expired reset token";
pub const RESET_LINK_MESSAGE: &str =
    "If an account exists for this email, a password reset link has been sent.";

/// Random bytes in a password-reset token.
const RESET_TOKEN_BYTES: usize = 32;

fn email_taken() -> ApiError {
    let mut errors = FieldErrors::new();
    errors.insert(
        "email".to_string(),
        vec!["This email is already registered.".to_string()],
    );
    ApiError {
        status: StatusCode::BAD_REQUEST,
        message: "This email is already associated with an account.".to_string(),
        errors: Some(errors),
    }
}

/// Six-digit customer reference, zero padded.
fn reference_number() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32))
}

/// Fresh reset token as lowercase hex.
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Reset tokens are stored as their SHA-256 digest only.
fn reset_token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Resolve a plaintext reset token to its unexpired owner.
fn resolve_reset_token<D>(directory: &D, token: &str) -> Result<User, ApiError>
where
    D: UserDirectory + ?Sized,
{
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request(INVALID_RESET_TOKEN_MESSAGE));
    }

    let user = directory
        .find_by_reset_token(&reset_token_digest(token))
        .ok_or_else(|| ApiError::bad_request(INVALID_RESET_TOKEN_MESSAGE))?;

    match user.reset_token_expires_at {
        Some(expires_at) if expires_at > Utc::now() => Ok(user),
        _ => Err(ApiError::bad_request(INVALID_RESET_TOKEN_MESSAGE)),
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 400, description = "Validation failed or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    validate_register(&request)?;
    let email = normalize_email(&request.email);

    if state.store.read().await.find_by_email(&email).is_some() {
        return Err(email_taken());
    }

    let credential = state.credentials.hash(request.password).await?;

    let mut store = state.store.write().await;
    for _ in 0..MAX_UNIQUE_ATTEMPTS {
        let new_user = NewUser {
            number: reference_number(),
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: email.clone(),
            phone: request
                .phone
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            credential: credential.clone(),
        };

        match store.insert_user(new_user) {
            Ok(user) => {
                info!(user_id = %user.id, "user registered");
                return Ok((
                    StatusCode::CREATED,
                    Json(MessageResponse::new("Account created successfully.")),
                ));
            }
            Err(StorageError::Conflict(UniqueField::ReferenceNumber)) => {
                debug!("reference number collision, retrying");
            }
            // Lost a race with a concurrent registration.
            Err(StorageError::Conflict(UniqueField::Email)) => return Err(email_taken()),
            Err(err) => return Err(err.into()),
        }
    }

    Err(ApiError::internal(
        "exhausted attempts to allocate a unique reference number",
    ))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_login(&request)?;
    let email = normalize_email(&request.email);

    let user = state.store.read().await.find_by_email(&email);
    let stored = user.as_ref().map(|u| u.credential.clone());

    // Runs a full verification even when the account is unknown.
    let verified = state.credentials.verify(request.password, stored).await;

    let Some(user) = user.filter(|_| verified) else {
        debug!("login rejected");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
    };

    let pair = state.tokens.issue_pair(user.id)?;
    info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful.".to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        data: LoginUser::from(&user),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh-token",
    request_body = RefreshTokenRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "New token pair", body = RefreshResponse),
        (status = 400, description = "Refresh token missing"),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshTokenRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let token = request.refresh_token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request(REFRESH_TOKEN_MISSING_MESSAGE));
    }

    let result = {
        let store = state.store.read().await;
        state.tokens.refresh(token, &*store)
    };

    let (pair, user) = match result {
        Ok(refreshed) => refreshed,
        Err(RefreshError::Signing(err)) => return Err(err.into()),
        Err(err) => {
            debug!(reason = %err, "refresh rejected");
            return Err(ApiError::unauthorized(INVALID_REFRESH_TOKEN_MESSAGE));
        }
    };

    Ok(Json(RefreshResponse {
        success: true,
        message: "Tokens refreshed successfully.".to_string(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        iva: u8::from(user.role.is_admin()),
        data: UserProfile::from(&user),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/reset-link",
    request_body = ResetLinkRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Generic acknowledgement", body = MessageResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn reset_link(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetLinkRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut v = Validator::new();
    v.email("email", &request.email);
    v.finish(StatusCode::BAD_REQUEST)?;

    let email = normalize_email(&request.email);
    let expires_at = Duration::try_seconds(state.config.reset_token_ttl_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| ApiError::internal("reset token lifetime out of range"))?;

    let issued = {
        let mut store = state.store.write().await;
        match store.find_by_email(&email) {
            None => None,
            Some(user) => {
                let mut issued = None;
                for _ in 0..MAX_UNIQUE_ATTEMPTS {
                    let token = generate_reset_token();
                    match store.set_reset_token(user.id, reset_token_digest(&token), expires_at) {
                        Ok(()) => {
                            issued = Some((user.email.clone(), token));
                            break;
                        }
                        Err(StorageError::Conflict(UniqueField::ResetToken)) => {
                            debug!("reset token collision, retrying");
                        }
                        Err(err) => return Err(err.into()),
                    }
                }
                match issued {
                    Some(issued) => Some(issued),
                    None => {
                        return Err(ApiError::internal(
                            "exhausted attempts to allocate a unique reset token",
                        ))
                    }
                }
            }
        }
    };

    if let Some((recipient, token)) = issued {
        if let Err(err) = state.mailer.send_password_reset(&recipient, &token) {
            warn!(error = %err, "failed to send password reset email");
        }
    } else {
        debug!("reset link requested for unknown email");
    }

    Ok(Json(MessageResponse::new(RESET_LINK_MESSAGE)))
}

#[utoipa::path(
    post,
    path = "/auth/validate-reset-token",
    request_body = ValidateResetTokenRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Token is usable", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token")
    )
)]
pub async fn validate_reset_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ValidateResetTokenRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    resolve_reset_token(&*state.store.read().await, &request.token)?;
    Ok(Json(MessageResponse::new("Reset token is valid.")))
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = ResetPasswordRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Validation failed or invalid reset token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    validate_new_password(&request.password)?;
    resolve_reset_token(&*state.store.read().await, &request.token)?;

    let credential = state.credentials.hash(request.password).await?;

    let mut store = state.store.write().await;
    // Resolve again: the token may have been consumed while hashing.
    let user = resolve_reset_token(&*store, &request.token)?;
    store.update_credential(user.id, credential)?;
    info!(user_id = %user.id, "password reset");

    Ok(Json(MessageResponse::new("Password has been reset.")))
}

#[utoipa::path(
    post,
    path = "/check-auth",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Authenticated user profile", body = UserProfile),
        (status = 401, description = "Unauthorized - invalid or missing token")
    )
)]
pub async fn check_auth(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<ApiResponse<UserProfile>>, ApiError> {
    let user = state
        .store
        .read()
        .await
        .find_by_id(user.principal_id)
        .ok_or_else(|| ApiError::unauthorized("User no longer exists."))?;

    Ok(Json(ApiResponse::ok(UserProfile::from(&user))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::api::tests::{register_and_login, send};
    use crate::auth::{Role, TokenType};
    use crate::models::PrincipalId;
    use crate::state::tests::{test_state, test_state_with_mailer};
    use serde_json::json;

    #[test]
    fn reference_numbers_are_six_digits() {
        for _ in 0..100 {
            let number = reference_number();
            assert_eq!(number.len(), 6);
            assert!(number.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn reset_tokens_are_random_hex() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
        assert_ne!(a, b);
        assert_ne!(reset_token_digest(&a), a);
        assert_eq!(reset_token_digest(&a), reset_token_digest(&a));
    }

    #[tokio::test]
    async fn register_then_login() {
        let app = router(test_state());
        let (id, access, refresh) = register_and_login(&app, "ada@example.com").await;
        assert!(id > 0);
        assert_ne!(access, refresh);
    }

    #[tokio::test]
    async fn register_rejects_invalid_form() {
        let app = router(test_state());
        let (status, body) = send(&app, "POST", "/auth/register", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed.");
        for field in ["first_name", "last_name", "email", "password"] {
            assert!(body["errors"][field].is_array(), "{field}");
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email_case_insensitively() {
        let app = router(test_state());
        register_and_login(&app, "ada@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/register",
            None,
            Some(json!({
                "first_name": "Other",
                "last_name": "Person",
                "email": "ADA@Example.com",
                "password": "another-password"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["email"][0], "This email is already registered.");
    }

    #[tokio::test]
    async fn register_stores_hash_and_reference_number() {
        let state = test_state();
        let app = router(state.clone());
        register_and_login(&app, "ada@example.com").await;

        let user = state
            .store
            .read()
            .await
            .find_by_email("ada@example.com")
            .unwrap();
        assert!(user.credential.as_str().starts_with("$argon2id$"));
        assert!(!user.credential.as_str().contains("analytical-engine"));
        assert_eq!(user.number.len(), 6);
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_identical() {
        let app = router(test_state());
        register_and_login(&app, "ada@example.com").await;

        let (wrong_status, wrong_body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "wrong-password"})),
        )
        .await;
        let (unknown_status, unknown_body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "wrong-password"})),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body["message"], INVALID_CREDENTIALS_MESSAGE);
        assert_eq!(unknown_body["message"], INVALID_CREDENTIALS_MESSAGE);
        assert_eq!(wrong_body["success"], unknown_body["success"]);
        assert!(wrong_body.get("errors").is_none());
        assert!(unknown_body.get("errors").is_none());
    }

    #[tokio::test]
    async fn login_validates_input() {
        let app = router(test_state());
        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "not-an-email"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["email"].is_array());
        assert!(body["errors"]["password"].is_array());
    }

    #[tokio::test]
    async fn login_returns_usable_access_token() {
        let state = test_state();
        let app = router(state.clone());
        let (id, access, refresh) = register_and_login(&app, "ada@example.com").await;

        let claims = state.tokens.validate_access_token(&access).unwrap();
        assert_eq!(claims.principal_id(), Some(PrincipalId(id)));
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(state.tokens.validate_refresh_token(&refresh).is_ok());

        let (status, body) = send(&app, "POST", "/check-auth", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], id);
        assert_eq!(body["data"]["email"], "ada@example.com");
        assert!(body["data"].get("credential").is_none());
    }

    #[tokio::test]
    async fn refresh_issues_new_pair_and_keeps_old_token_valid() {
        let state = test_state();
        let app = router(state.clone());
        let (id, _, refresh) = register_and_login(&app, "ada@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/refresh-token",
            None,
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["iva"], 0);
        assert_eq!(body["data"]["id"], id);

        let new_access = body["access_token"].as_str().unwrap();
        let new_refresh = body["refresh_token"].as_str().unwrap();
        assert_ne!(new_refresh, refresh);
        let claims = state.tokens.validate_access_token(new_access).unwrap();
        assert_eq!(claims.principal_id(), Some(PrincipalId(id)));

        // Stateless: the consumed refresh token still works.
        let (status, _) = send(
            &app,
            "POST",
            "/auth/refresh-token",
            None,
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn refresh_reports_admin_flag() {
        let state = test_state();
        let app = router(state.clone());
        let (id, _, refresh) = register_and_login(&app, "root@example.com").await;
        state
            .store
            .write()
            .await
            .set_role(PrincipalId(id), Role::Admin)
            .unwrap();

        let (_, body) = send(
            &app,
            "POST",
            "/auth/refresh-token",
            None,
            Some(json!({"refresh_token": refresh})),
        )
        .await;
        assert_eq!(body["iva"], 1);
        assert_eq!(body["data"]["role"], "admin");
    }

    #[tokio::test]
    async fn refresh_failures() {
        let state = test_state();
        let app = router(state.clone());
        let (_, access, _) = register_and_login(&app, "ada@example.com").await;

        let (status, body) = send(&app, "POST", "/auth/refresh-token", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], REFRESH_TOKEN_MISSING_MESSAGE);

        let orphan = state.tokens.issue_refresh_token(PrincipalId(9999)).unwrap();
        for token in [access.as_str(), "garbage", orphan.as_str()] {
            let (status, body) = send(
                &app,
                "POST",
                "/auth/refresh-token",
                None,
                Some(json!({"refresh_token": token})),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], INVALID_REFRESH_TOKEN_MESSAGE);
        }
    }

    #[tokio::test]
    async fn check_auth_for_deleted_principal_is_unauthorized() {
        let state = test_state();
        let token = state.tokens.issue_access_token(PrincipalId(404)).unwrap();
        let app = router(state);

        let (status, body) = send(&app, "POST", "/check-auth", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn reset_link_is_generic_for_unknown_email() {
        let (state, mailer) = test_state_with_mailer();
        let app = router(state);

        let (status, body) = send(
            &app,
            "POST",
            "/auth/reset-link",
            None,
            Some(json!({"email": "nobody@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], RESET_LINK_MESSAGE);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let (state, mailer) = test_state_with_mailer();
        let app = router(state.clone());
        register_and_login(&app, "ada@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/reset-link",
            None,
            Some(json!({"email": "Ada@Example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], RESET_LINK_MESSAGE);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let (recipient, token) = sent[0].clone();
        assert_eq!(recipient, "ada@example.com");

        // Only the digest is stored.
        let stored = state
            .store
            .read()
            .await
            .find_by_email("ada@example.com")
            .unwrap();
        assert_eq!(stored.reset_token_digest, Some(reset_token_digest(&token)));

        let (status, _) = send(
            &app,
            "POST",
            "/auth/validate-reset-token",
            None,
            Some(json!({"token": token})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/auth/reset-password",
            None,
            Some(json!({"token": token, "password": "short"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["errors"]["password"].is_array());

        let (status, _) = send(
            &app,
            "POST",
            "/auth/reset-password",
            None,
            Some(json!({"token": token, "password": "a-brand-new-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // The token is single use.
        let (status, body) = send(
            &app,
            "POST",
            "/auth/validate-reset-token",
            None,
            Some(json!({"token": token})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], INVALID_RESET_TOKEN_MESSAGE);

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "analytical-engine"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "a-brand-new-password"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn expired_reset_token_is_rejected() {
        let state = test_state();
        let app = router(state.clone());
        let (id, _, _) = register_and_login(&app, "ada@example.com").await;

        let token = generate_reset_token();
        state
            .store
            .write()
            .await
            .set_reset_token(
                PrincipalId(id),
                reset_token_digest(&token),
                Utc::now() - Duration::seconds(1),
            )
            .unwrap();

        let (status, body) = send(
            &app,
            "POST",
            "/auth/validate-reset-token",
            None,
            Some(json!({"token": token})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], INVALID_RESET_TOKEN_MESSAGE);
    }
}

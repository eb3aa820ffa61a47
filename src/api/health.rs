// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Probes for orchestrators. Both are public and never touch user data.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{models::PrincipalId, state::AppState};

const STORE_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

const OK: &str = "ok";

/// Liveness body.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Readiness body: `"ok"` only when every dependency answered.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    pub status: String,
    pub store: String,
    pub token_signing: String,
}

impl ReadyResponse {
    fn is_ready(&self) -> bool {
        self.store == OK && self.token_signing == OK
    }
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is up", body = HealthResponse))
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: OK.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// 503 when the store lock stays held past the timeout or the signing keys
/// cannot mint a token.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready for traffic", body = ReadyResponse),
        (status = 503, description = "A dependency is unavailable", body = ReadyResponse)
    )
)]
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let store = match tokio::time::timeout(STORE_LOCK_TIMEOUT, state.store.read()).await {
        Ok(_) => OK,
        Err(_) => {
            tracing::warn!("readiness: store lock not acquired in time");
            "unavailable"
        }
    };

    let token_signing = match state.tokens.issue_access_token(PrincipalId(0)) {
        Ok(_) => OK,
        Err(err) => {
            tracing::warn!(error = %err, "readiness: token signing failed");
            "unavailable"
        }
    };

    let mut response = ReadyResponse {
        status: OK.to_string(),
        store: store.to_string(),
        token_signing: token_signing.to_string(),
    };
    if response.is_ready() {
        (StatusCode::OK, Json(response))
    } else {
        response.status = "degraded".to_string();
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn liveness_reports_version() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn ready_when_store_and_signing_work() {
        let (status, Json(body)) = readiness(State(test_state())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.store, "ok");
        assert_eq!(body.token_signing, "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn held_store_lock_degrades_readiness() {
        let state = test_state();
        let _writer = state.store.write().await;

        let (status, Json(body)) = readiness(State(state.clone())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "degraded");
        assert_eq!(body.store, "unavailable");
        assert_eq!(body.token_signing, "ok");
    }
}

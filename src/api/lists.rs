// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use super::{ApiResponse, MessageResponse};
use crate::{
    auth::Auth,
    error::{ApiError, ApiJson, ApiPath},
    models::{ShoppingList, ShoppingListRequest},
    state::AppState,
    storage::ListRepository,
    validation::validate_list_name,
};

#[utoipa::path(
    get,
    path = "/shopping-lists",
    tag = "Shopping Lists",
    security(("bearer" = [])),
    responses((status = 200, description = "Live lists, newest first", body = [ShoppingList]))
)]
pub async fn list_shopping_lists(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<ApiResponse<Vec<ShoppingList>>>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(ApiResponse::ok(store.lists_for_owner(user.principal_id))))
}

#[utoipa::path(
    post,
    path = "/shopping-lists",
    request_body = ShoppingListRequest,
    tag = "Shopping Lists",
    security(("bearer" = [])),
    responses(
        (status = 201, body = ShoppingList),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_shopping_list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiJson(request): ApiJson<ShoppingListRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShoppingList>>), ApiError> {
    let name = validate_list_name(&request)?;

    let mut store = state.store.write().await;
    let list = store.create_list(user.principal_id, name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(list, "List created successfully.")),
    ))
}

#[utoipa::path(
    get,
    path = "/shopping-lists/{id}",
    params(("id" = u64, Path, description = "Shopping list identifier")),
    tag = "Shopping Lists",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ShoppingList),
        (status = 404, description = "No such list for this user")
    )
)]
pub async fn get_shopping_list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<ApiResponse<ShoppingList>>, ApiError> {
    let store = state.store.read().await;
    let list = store.find_list(user.principal_id, id)?;
    Ok(Json(ApiResponse::ok(list)))
}

#[utoipa::path(
    put,
    path = "/shopping-lists/{id}",
    params(("id" = u64, Path, description = "Shopping list identifier")),
    request_body = ShoppingListRequest,
    tag = "Shopping Lists",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ShoppingList),
        (status = 404, description = "No such list for this user"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_shopping_list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<ShoppingListRequest>,
) -> Result<Json<ApiResponse<ShoppingList>>, ApiError> {
    let name = validate_list_name(&request)?;

    let mut store = state.store.write().await;
    let list = store.rename_list(user.principal_id, id, name)?;
    Ok(Json(ApiResponse::with_message(list, "List updated successfully.")))
}

#[utoipa::path(
    delete,
    path = "/shopping-lists/{id}",
    params(("id" = u64, Path, description = "Shopping list identifier")),
    tag = "Shopping Lists",
    security(("bearer" = [])),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, description = "No such list for this user")
    )
)]
pub async fn delete_shopping_list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut store = state.store.write().await;
    store.soft_delete_list(user.principal_id, id)?;
    Ok(Json(MessageResponse::new("List deleted successfully.")))
}

#[utoipa::path(
    post,
    path = "/shopping-lists/{id}/restore",
    params(("id" = u64, Path, description = "Shopping list identifier")),
    tag = "Shopping Lists",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ShoppingList),
        (status = 404, description = "No such list for this user")
    )
)]
pub async fn restore_shopping_list(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<ApiResponse<ShoppingList>>, ApiError> {
    let mut store = state.store.write().await;
    let list = store.restore_list(user.principal_id, id)?;
    Ok(Json(ApiResponse::with_message(list, "List restored successfully.")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::router;
    use crate::api::tests::{register_and_login, send};
    use crate::state::tests::test_state;
    use serde_json::json;

    #[tokio::test]
    async fn list_lifecycle() {
        let app = router(test_state());
        let (user_id, token, _) = register_and_login(&app, "ada@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/shopping-lists",
            Some(&token),
            Some(json!({"name": "  Groceries "})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Groceries");
        assert_eq!(body["data"]["user_id"], user_id);
        let id = body["data"]["id"].as_u64().unwrap();

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/shopping-lists/{id}"),
            Some(&token),
            Some(json!({"name": "Weekly"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Weekly");

        let (status, body) = send(&app, "GET", &format!("/shopping-lists/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Weekly");

        let (status, _) = send(&app, "DELETE", &format!("/shopping-lists/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", &format!("/shopping-lists/{id}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (_, body) = send(&app, "GET", "/shopping-lists", Some(&token), None).await;
        assert_eq!(body["data"], json!([]));

        let (status, body) = send(
            &app,
            "POST",
            &format!("/shopping-lists/{id}/restore"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["deleted_at"].is_null());

        let (_, body) = send(&app, "GET", "/shopping-lists", Some(&token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lists_are_newest_first() {
        let app = router(test_state());
        let (_, token, _) = register_and_login(&app, "ada@example.com").await;

        for name in ["first", "second", "third"] {
            send(
                &app,
                "POST",
                "/shopping-lists",
                Some(&token),
                Some(json!({"name": name})),
            )
            .await;
        }

        let (_, body) = send(&app, "GET", "/shopping-lists", Some(&token), None).await;
        let names: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn lists_are_invisible_to_other_users() {
        let app = router(test_state());
        let (_, owner, _) = register_and_login(&app, "owner@example.com").await;
        let (_, intruder, _) = register_and_login(&app, "intruder@example.com").await;

        let (_, body) = send(
            &app,
            "POST",
            "/shopping-lists",
            Some(&owner),
            Some(json!({"name": "Private"})),
        )
        .await;
        let id = body["data"]["id"].as_u64().unwrap();
        let uri = format!("/shopping-lists/{id}");

        let (status, _) = send(&app, "GET", &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "PUT", &uri, Some(&intruder), Some(json!({"name": "Mine"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "DELETE", &uri, Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "POST", &format!("{uri}/restore"), Some(&intruder), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, "GET", "/shopping-lists", Some(&intruder), None).await;
        assert_eq!(body["data"], json!([]));

        let (status, body) = send(&app, "GET", &uri, Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Private");
    }

    #[tokio::test]
    async fn invalid_names_are_422() {
        let app = router(test_state());
        let (_, token, _) = register_and_login(&app, "ada@example.com").await;

        for body in [json!({}), json!({"name": ""}), json!({"name": "x".repeat(256)})] {
            let (status, response) =
                send(&app, "POST", "/shopping-lists", Some(&token), Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert!(response["errors"]["name"].is_array());
        }
    }

    #[tokio::test]
    async fn non_numeric_id_is_400() {
        let app = router(test_state());
        let (_, token, _) = register_and_login(&app, "ada@example.com").await;

        let (status, body) = send(&app, "GET", "/shopping-lists/abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}

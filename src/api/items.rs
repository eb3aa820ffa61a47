// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Items are only reachable through a live list the caller owns.

use axum::{extract::State, http::StatusCode, Json};

use super::{ApiResponse, MessageResponse};
use crate::{
    auth::Auth,
    error::{ApiError, ApiJson, ApiPath},
    models::{ListItem, ListItemRequest},
    state::AppState,
    storage::{ItemRepository, ListRepository},
    validation::{validate_item_changes, validate_new_item},
};

#[utoipa::path(
    get,
    path = "/shopping-lists/{id}/items",
    params(("id" = u64, Path, description = "Shopping list identifier")),
    tag = "Items",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Unpurchased first, then newest first", body = [ListItem]),
        (status = 404, description = "No such list for this user")
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath(list_id): ApiPath<u64>,
) -> Result<Json<ApiResponse<Vec<ListItem>>>, ApiError> {
    let store = state.store.read().await;
    let list = store.find_list(user.principal_id, list_id)?;
    Ok(Json(ApiResponse::ok(store.items_in_list(list.id))))
}

#[utoipa::path(
    post,
    path = "/shopping-lists/{id}/items",
    params(("id" = u64, Path, description = "Shopping list identifier")),
    request_body = ListItemRequest,
    tag = "Items",
    security(("bearer" = [])),
    responses(
        (status = 201, body = ListItem),
        (status = 404, description = "No such list for this user"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath(list_id): ApiPath<u64>,
    ApiJson(request): ApiJson<ListItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ListItem>>), ApiError> {
    let new_item = validate_new_item(&request)?;

    let mut store = state.store.write().await;
    let list = store.find_list(user.principal_id, list_id)?;
    let item = store.create_item(list.id, new_item);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(item, "Item added successfully.")),
    ))
}

#[utoipa::path(
    put,
    path = "/shopping-lists/{id}/items/{item_id}",
    params(
        ("id" = u64, Path, description = "Shopping list identifier"),
        ("item_id" = u64, Path, description = "Item identifier")
    ),
    request_body = ListItemRequest,
    tag = "Items",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ListItem),
        (status = 404, description = "No such list or item for this user"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath((list_id, item_id)): ApiPath<(u64, u64)>,
    ApiJson(request): ApiJson<ListItemRequest>,
) -> Result<Json<ApiResponse<ListItem>>, ApiError> {
    let changes = validate_item_changes(&request)?;

    let mut store = state.store.write().await;
    let list = store.find_list(user.principal_id, list_id)?;
    let item = store.update_item(list.id, item_id, changes)?;
    Ok(Json(ApiResponse::with_message(item, "Item updated successfully.")))
}

#[utoipa::path(
    patch,
    path = "/shopping-lists/{id}/items/{item_id}/toggle",
    params(
        ("id" = u64, Path, description = "Shopping list identifier"),
        ("item_id" = u64, Path, description = "Item identifier")
    ),
    tag = "Items",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ListItem),
        (status = 404, description = "No such list or item for this user")
    )
)]
pub async fn toggle_item(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath((list_id, item_id)): ApiPath<(u64, u64)>,
) -> Result<Json<ApiResponse<ListItem>>, ApiError> {
    let mut store = state.store.write().await;
    let list = store.find_list(user.principal_id, list_id)?;
    let item = store.toggle_item(list.id, item_id)?;
    Ok(Json(ApiResponse::with_message(item, "Purchase status updated.")))
}

#[utoipa::path(
    delete,
    path = "/shopping-lists/{id}/items/{item_id}",
    params(
        ("id" = u64, Path, description = "Shopping list identifier"),
        ("item_id" = u64, Path, description = "Item identifier")
    ),
    tag = "Items",
    security(("bearer" = [])),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, description = "No such list or item for this user")
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath((list_id, item_id)): ApiPath<(u64, u64)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut store = state.store.write().await;
    let list = store.find_list(user.principal_id, list_id)?;
    store.soft_delete_item(list.id, item_id)?;
    Ok(Json(MessageResponse::new("Item deleted successfully.")))
}

#[utoipa::path(
    post,
    path = "/shopping-lists/{id}/items/{item_id}/restore",
    params(
        ("id" = u64, Path, description = "Shopping list identifier"),
        ("item_id" = u64, Path, description = "Item identifier")
    ),
    tag = "Items",
    security(("bearer" = [])),
    responses(
        (status = 200, body = ListItem),
        (status = 404, description = "No such list or item for this user")
    )
)]
pub async fn restore_item(
    State(state): State<AppState>,
    Auth(user): Auth,
    ApiPath((list_id, item_id)): ApiPath<(u64, u64)>,
) -> Result<Json<ApiResponse<ListItem>>, ApiError> {
    let mut store = state.store.write().await;
    let list = store.find_list(user.principal_id, list_id)?;
    let item = store.restore_item(list.id, item_id)?;
    Ok(Json(ApiResponse::with_message(item, "Item restored successfully.")))
}

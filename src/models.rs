// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the stored records and the request/response data
//! structures used by the REST API. Request and response types derive
//! `ToSchema` for OpenAPI documentation.
//!
//! ## Principal Identifier
//!
//! The [`PrincipalId`] newtype wraps the numeric user identifier. It is the
//! only piece of the user that is ever embedded in a token.
//!
//! ## Model Categories
//!
//! - **Users**: Accounts, profiles and authentication forms
//! - **Shopping Lists**: Owner-scoped lists with soft delete
//! - **List Items**: Products inside a list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Credential, Role};

// =============================================================================
// Principal Identifier
// =============================================================================

/// Numeric identifier of an authenticated actor.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct PrincipalId(pub u64);

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PrincipalId {
    fn from(value: u64) -> Self {
        PrincipalId(value)
    }
}

impl std::str::FromStr for PrincipalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(PrincipalId)
    }
}

// =============================================================================
// User Models
// =============================================================================

/// A user account as held by the user directory.
///
/// Not `Serialize`: the credential must never leave the process. Use
/// [`UserProfile`] for anything that goes on the wire.
#[derive(Debug, Clone)]
pub struct User {
    pub id: PrincipalId,
    /// Six-digit public reference number, unique per user.
    pub number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub email_verified: bool,
    pub credential: Credential,
    /// SHA-256 digest (hex) of the outstanding password-reset token.
    pub reset_token_digest: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a user about to be inserted. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub credential: Credential,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct UserProfile {
    pub id: PrincipalId,
    pub number: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub email_verified: bool,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            number: user.number.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            email_verified: user.email_verified,
            role: user.role,
        }
    }
}

/// Short user summary returned by the login endpoint.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct LoginUser {
    pub id: PrincipalId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for LoginUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Request to create an account.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

/// Request to log in with email and password.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to exchange a refresh token for a new token pair.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request to receive a password-reset token by email.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ResetLinkRequest {
    pub email: String,
}

/// Request to check that a password-reset token is still usable.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ValidateResetTokenRequest {
    pub token: String,
}

/// Request to set a new password with a reset token.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Tokens returned by login.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub data: LoginUser,
}

/// Tokens returned by a refresh.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub data: UserProfile,
    /// `1` when the user is an administrator, `0` otherwise.
    pub iva: u8,
}

// =============================================================================
// Shopping List Models
// =============================================================================

/// A shopping list owned by one user.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct ShoppingList {
    pub id: u64,
    pub user_id: PrincipalId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the list is soft-deleted.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Request body for creating or renaming a list.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ShoppingListRequest {
    pub name: Option<String>,
}

// =============================================================================
// List Item Models
// =============================================================================

/// A product entry inside a shopping list.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct ListItem {
    pub id: u64,
    pub list_id: u64,
    pub product_name: String,
    pub quantity: i64,
    pub price: Option<f64>,
    pub store_name: Option<String>,
    pub is_purchased: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Validated fields for a new item.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListItem {
    pub product_name: String,
    pub quantity: i64,
    pub price: Option<f64>,
    pub store_name: Option<String>,
    pub is_purchased: bool,
}

/// Validated partial update of an item. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItemChanges {
    pub product_name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub store_name: Option<String>,
    pub is_purchased: Option<bool>,
}

/// Raw item body as sent by clients.
///
/// Fields are kept as JSON values so type mismatches are reported per field
/// instead of rejecting the whole body.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ListItemRequest {
    #[schema(value_type = Option<String>)]
    pub product_name: Option<serde_json::Value>,
    #[schema(value_type = Option<i64>)]
    pub quantity: Option<serde_json::Value>,
    #[schema(value_type = Option<f64>)]
    pub price: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub store_name: Option<serde_json::Value>,
    #[schema(value_type = Option<bool>)]
    pub is_purchased: Option<serde_json::Value>,
}

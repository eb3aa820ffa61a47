// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role of a user account.
///
/// Roles live in the user directory only. Tokens carry the principal id,
/// so a role change takes effect at the next directory lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account holder
    #[default]
    User,
    /// Administrator
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

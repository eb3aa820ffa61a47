// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ownership enforcement for owner-scoped records.
//!
//! A record owned by someone else is reported as not found, so callers
//! cannot probe which ids exist.

use super::{StorageError, StorageResult};
use crate::models::{PrincipalId, ShoppingList};

/// Trait for resources that have an owner.
pub trait OwnedResource {
    /// Get the owner's principal id.
    fn owner_id(&self) -> PrincipalId;

    /// Human-readable resource name for error messages.
    fn resource_name(&self) -> &'static str;
}

impl OwnedResource for ShoppingList {
    fn owner_id(&self) -> PrincipalId {
        self.user_id
    }

    fn resource_name(&self) -> &'static str {
        "Shopping list"
    }
}

/// Narrow a lookup result down to records owned by `owner`.
pub trait OwnershipCheck<T> {
    fn owned_by(self, owner: PrincipalId) -> StorageResult<T>;
}

impl<T: OwnedResource> OwnershipCheck<T> for StorageResult<T> {
    fn owned_by(self, owner: PrincipalId) -> StorageResult<T> {
        let resource = self?;
        if resource.owner_id() == owner {
            Ok(resource)
        } else {
            Err(StorageError::NotFound(resource.resource_name().to_string()))
        }
    }
}

impl<T: OwnedResource> OwnershipCheck<T> for Option<T> {
    fn owned_by(self, owner: PrincipalId) -> StorageResult<T> {
        match self {
            Some(resource) => Ok(resource).owned_by(owner),
            None => Err(StorageError::NotFound("resource".to_string())),
        }
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Repository traits.

use chrono::{DateTime, Utc};

use super::StorageResult;
use crate::auth::Credential;
use crate::models::{
    ListItem, ListItemChanges, NewListItem, NewUser, PrincipalId, ShoppingList, User,
};

/// User directory consulted by login, registration and refresh.
pub trait UserDirectory {
    fn find_by_id(&self, id: PrincipalId) -> Option<User>;

    /// Exact match on the stored (lowercased) email.
    fn find_by_email(&self, email: &str) -> Option<User>;

    /// Insert a new user.
    ///
    /// # Errors
    /// `Conflict(Email)` or `Conflict(ReferenceNumber)` when either value is
    /// already taken.
    fn insert_user(&mut self, user: NewUser) -> StorageResult<User>;

    /// Store the digest of a password-reset token.
    ///
    /// # Errors
    /// `Conflict(ResetToken)` when another user holds the same digest,
    /// `NotFound` when the user does not exist.
    fn set_reset_token(
        &mut self,
        id: PrincipalId,
        digest: String,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    fn find_by_reset_token(&self, digest: &str) -> Option<User>;

    /// Replace the credential and clear any outstanding reset token.
    fn update_credential(&mut self, id: PrincipalId, credential: Credential) -> StorageResult<()>;
}

/// Owner-scoped shopping lists. Soft-deleted lists are invisible except to
/// [`restore_list`](ListRepository::restore_list).
pub trait ListRepository {
    /// Live lists of `owner`, newest first.
    fn lists_for_owner(&self, owner: PrincipalId) -> Vec<ShoppingList>;

    fn find_list(&self, owner: PrincipalId, list_id: u64) -> StorageResult<ShoppingList>;

    fn create_list(&mut self, owner: PrincipalId, name: String) -> ShoppingList;

    fn rename_list(&mut self, owner: PrincipalId, list_id: u64, name: String) -> StorageResult<ShoppingList>;

    fn soft_delete_list(&mut self, owner: PrincipalId, list_id: u64) -> StorageResult<()>;

    /// Restore a list, deleted or not.
    fn restore_list(&mut self, owner: PrincipalId, list_id: u64) -> StorageResult<ShoppingList>;
}

/// Items of one list. Callers resolve list ownership first through
/// [`ListRepository`].
pub trait ItemRepository {
    /// Live items, unpurchased first, then newest first.
    fn items_in_list(&self, list_id: u64) -> Vec<ListItem>;

    fn create_item(&mut self, list_id: u64, item: NewListItem) -> ListItem;

    fn update_item(&mut self, list_id: u64, item_id: u64, changes: ListItemChanges) -> StorageResult<ListItem>;

    /// Flip `is_purchased`.
    fn toggle_item(&mut self, list_id: u64, item_id: u64) -> StorageResult<ListItem>;

    fn soft_delete_item(&mut self, list_id: u64, item_id: u64) -> StorageResult<()>;

    fn restore_item(&mut self, list_id: u64, item_id: u64) -> StorageResult<ListItem>;
}

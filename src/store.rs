// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory store implementing every repository trait.
//!
//! The store is shared through `AppState` behind a `tokio::sync::RwLock`.
//! Unique constraints are checked and applied inside a single `&mut self`
//! call, so they hold under concurrent writers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::auth::{Credential, Role};
use crate::models::{
    ListItem, ListItemChanges, NewListItem, NewUser, PrincipalId, ShoppingList, User,
};
use crate::storage::{
    ItemRepository, ListRepository, OwnershipCheck, StorageError, StorageResult, UniqueField,
    UserDirectory,
};

#[derive(Default)]
pub struct InMemoryStore {
    users: BTreeMap<PrincipalId, User>,
    lists: BTreeMap<u64, ShoppingList>,
    items: BTreeMap<u64, ListItem>,
    next_user_id: u64,
    next_list_id: u64,
    next_item_id: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change a user's role. Used for seeding administrators.
    pub fn set_role(&mut self, id: PrincipalId, role: Role) -> StorageResult<()> {
        let user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("User {id}")))?;
        user.role = role;
        Ok(())
    }

    fn list_mut(&mut self, owner: PrincipalId, list_id: u64, include_deleted: bool) -> StorageResult<&mut ShoppingList> {
        self.lists
            .get(&list_id)
            .filter(|list| include_deleted || list.deleted_at.is_none())
            .cloned()
            .owned_by(owner)
            .map_err(|_| StorageError::NotFound(format!("Shopping list {list_id}")))?;

        self.lists
            .get_mut(&list_id)
            .ok_or_else(|| StorageError::NotFound(format!("Shopping list {list_id}")))
    }

    fn item_mut(&mut self, list_id: u64, item_id: u64, include_deleted: bool) -> StorageResult<&mut ListItem> {
        self.items
            .get_mut(&item_id)
            .filter(|item| item.list_id == list_id && (include_deleted || item.deleted_at.is_none()))
            .ok_or_else(|| StorageError::NotFound(format!("Item {item_id}")))
    }
}

fn newest_first<T>(created: impl Fn(&T) -> (DateTime<Utc>, u64)) -> impl Fn(&T, &T) -> std::cmp::Ordering {
    move |a, b| created(b).cmp(&created(a))
}

impl UserDirectory for InMemoryStore {
    fn find_by_id(&self, id: PrincipalId) -> Option<User> {
        self.users.get(&id).cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    fn insert_user(&mut self, new_user: NewUser) -> StorageResult<User> {
        if self.find_by_email(&new_user.email).is_some() {
            return Err(StorageError::Conflict(UniqueField::Email));
        }
        if self.users.values().any(|user| user.number == new_user.number) {
            return Err(StorageError::Conflict(UniqueField::ReferenceNumber));
        }

        self.next_user_id += 1;
        let user = User {
            id: PrincipalId(self.next_user_id),
            number: new_user.number,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email.to_lowercase(),
            phone: new_user.phone,
            role: Role::User,
            email_verified: false,
            credential: new_user.credential,
            reset_token_digest: None,
            reset_token_expires_at: None,
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn set_reset_token(
        &mut self,
        id: PrincipalId,
        digest: String,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let taken = self
            .users
            .values()
            .any(|user| user.id != id && user.reset_token_digest.as_deref() == Some(digest.as_str()));
        if taken {
            return Err(StorageError::Conflict(UniqueField::ResetToken));
        }

        let user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("User {id}")))?;
        user.reset_token_digest = Some(digest);
        user.reset_token_expires_at = Some(expires_at);
        Ok(())
    }

    fn find_by_reset_token(&self, digest: &str) -> Option<User> {
        self.users
            .values()
            .find(|user| user.reset_token_digest.as_deref() == Some(digest))
            .cloned()
    }

    fn update_credential(&mut self, id: PrincipalId, credential: Credential) -> StorageResult<()> {
        let user = self
            .users
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("User {id}")))?;
        user.credential = credential;
        user.reset_token_digest = None;
        user.reset_token_expires_at = None;
        Ok(())
    }
}

impl ListRepository for InMemoryStore {
    fn lists_for_owner(&self, owner: PrincipalId) -> Vec<ShoppingList> {
        let mut lists: Vec<ShoppingList> = self
            .lists
            .values()
            .filter(|list| list.user_id == owner && list.deleted_at.is_none())
            .cloned()
            .collect();
        lists.sort_by(newest_first(|l: &ShoppingList| (l.created_at, l.id)));
        lists
    }

    fn find_list(&self, owner: PrincipalId, list_id: u64) -> StorageResult<ShoppingList> {
        self.lists
            .get(&list_id)
            .filter(|list| list.deleted_at.is_none())
            .cloned()
            .owned_by(owner)
            .map_err(|_| StorageError::NotFound(format!("Shopping list {list_id}")))
    }

    fn create_list(&mut self, owner: PrincipalId, name: String) -> ShoppingList {
        self.next_list_id += 1;
        let now = Utc::now();
        let list = ShoppingList {
            id: self.next_list_id,
            user_id: owner,
            name,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.lists.insert(list.id, list.clone());
        list
    }

    fn rename_list(&mut self, owner: PrincipalId, list_id: u64, name: String) -> StorageResult<ShoppingList> {
        let list = self.list_mut(owner, list_id, false)?;
        list.name = name;
        list.updated_at = Utc::now();
        Ok(list.clone())
    }

    fn soft_delete_list(&mut self, owner: PrincipalId, list_id: u64) -> StorageResult<()> {
        let list = self.list_mut(owner, list_id, false)?;
        list.deleted_at = Some(Utc::now());
        Ok(())
    }

    fn restore_list(&mut self, owner: PrincipalId, list_id: u64) -> StorageResult<ShoppingList> {
        let list = self.list_mut(owner, list_id, true)?;
        list.deleted_at = None;
        list.updated_at = Utc::now();
        Ok(list.clone())
    }
}

impl ItemRepository for InMemoryStore {
    fn items_in_list(&self, list_id: u64) -> Vec<ListItem> {
        let mut items: Vec<ListItem> = self
            .items
            .values()
            .filter(|item| item.list_id == list_id && item.deleted_at.is_none())
            .cloned()
            .collect();
        let newest = newest_first(|i: &ListItem| (i.created_at, i.id));
        items.sort_by(|a, b| a.is_purchased.cmp(&b.is_purchased).then_with(|| newest(a, b)));
        items
    }

    fn create_item(&mut self, list_id: u64, item: NewListItem) -> ListItem {
        self.next_item_id += 1;
        let now = Utc::now();
        let item = ListItem {
            id: self.next_item_id,
            list_id,
            product_name: item.product_name,
            quantity: item.quantity,
            price: item.price,
            store_name: item.store_name,
            is_purchased: item.is_purchased,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.items.insert(item.id, item.clone());
        item
    }

    fn update_item(&mut self, list_id: u64, item_id: u64, changes: ListItemChanges) -> StorageResult<ListItem> {
        let item = self.item_mut(list_id, item_id, false)?;
        if let Some(product_name) = changes.product_name {
            item.product_name = product_name;
        }
        if let Some(quantity) = changes.quantity {
            item.quantity = quantity;
        }
        if let Some(price) = changes.price {
            item.price = Some(price);
        }
        if let Some(store_name) = changes.store_name {
            item.store_name = Some(store_name);
        }
        if let Some(is_purchased) = changes.is_purchased {
            item.is_purchased = is_purchased;
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    fn toggle_item(&mut self, list_id: u64, item_id: u64) -> StorageResult<ListItem> {
        let item = self.item_mut(list_id, item_id, false)?;
        item.is_purchased = !item.is_purchased;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    fn soft_delete_item(&mut self, list_id: u64, item_id: u64) -> StorageResult<()> {
        let item = self.item_mut(list_id, item_id, false)?;
        item.deleted_at = Some(Utc::now());
        Ok(())
    }

    fn restore_item(&mut self, list_id: u64, item_id: u64) -> StorageResult<ListItem> {
        let item = self.item_mut(list_id, item_id, true)?;
        item.deleted_at = None;
        item.updated_at = Utc::now();
        Ok(item.clone())
    }
}

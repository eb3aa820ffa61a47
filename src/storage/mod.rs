// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Repository interfaces the HTTP layer talks to. Each repository returns
//! plain data values; relations (which list an item belongs to, who owns a
//! list) are resolved explicitly by the caller.
//!
//! ## Uniqueness
//!
//! Unique fields (user email, user reference number, reset-token digest) are
//! enforced by the store at write time and reported as
//! [`StorageError::Conflict`]. Callers that generate random values retry a
//! bounded number of times instead of checking first and inserting later.

pub mod ownership;
pub mod repository;

use thiserror::Error;

pub use ownership::{OwnedResource, OwnershipCheck};
pub use repository::{ItemRepository, ListRepository, UserDirectory};

/// Unique field rejected by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    ReferenceNumber,
    ResetToken,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Email => write!(f, "email"),
            UniqueField::ReferenceNumber => write!(f, "reference number"),
            UniqueField::ResetToken => write!(f, "reset token"),
        }
    }
}

/// Error type for storage operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Entity not found (or not visible to the caller)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Unique constraint violated
    #[error("Conflict on {0}")]
    Conflict(UniqueField),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Attempts made when a randomly generated unique value collides.
pub const MAX_UNIQUE_ATTEMPTS: usize = 5;

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Epilist API - Shopping List Service
//!
//! This crate provides a multi-tenant shopping-list backend. Users register,
//! log in and receive stateless access/refresh token pairs; every list and
//! item is scoped to the principal carried by the access token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and the router
//! - `auth` - Token issuance, verification and password hashing
//! - `storage` - Repository traits and ownership checks
//! - `store` - In-memory implementation of the repositories
//! - `validation` - Request field rules and error collection

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod validation;

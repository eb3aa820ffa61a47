// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::{CredentialVerifier, HashError, TokenService};
use crate::config::AppConfig;
use crate::mail::Mailer;
use crate::store::InMemoryStore;

/// Shared handler state. Everything except the store is read-only.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub credentials: CredentialVerifier,
    pub store: Arc<RwLock<InMemoryStore>>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: AppConfig, store: InMemoryStore, mailer: Arc<dyn Mailer>) -> Result<Self, HashError> {
        let tokens = TokenService::new(&config.signing);
        let credentials = CredentialVerifier::argon2(config.password_hash)?;

        Ok(Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            credentials,
            store: Arc::new(RwLock::new(store)),
            mailer,
        })
    }
}

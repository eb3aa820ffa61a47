// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process, sync::Arc};

use epilist_api::{
    api::router,
    config::{load_env_file, AppConfig},
    mail::TracingMailer,
    state::AppState,
    store::InMemoryStore,
    telemetry::{init_tracing, LogSettings},
};

#[tokio::main]
async fn main() {
    // Before anything reads the environment, logging included.
    let env_file = load_env_file();
    init_tracing(&LogSettings::from_env());
    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "loaded env file");
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "Invalid configuration");
            process::exit(1);
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let addr: SocketAddr = match addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(%addr, error = %err, "Failed to parse bind address");
            process::exit(1);
        }
    };

    let state = match AppState::new(config, InMemoryStore::new(), Arc::new(TracingMailer)) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!(error = %err, "Failed to initialise application state");
            process::exit(1);
        }
    };
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "Failed to bind");
            process::exit(1);
        }
    };

    tracing::info!(%addr, "Epilist API listening (docs at /docs)");

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %err, "Server failed");
        process::exit(1);
    }

    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

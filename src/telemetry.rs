// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{DEFAULT_LOG_FILTER, LOG_FORMAT_ENV};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Anything other than `json` (case-insensitive) selects pretty output.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Output format and filter directives for the global subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub format: LogFormat,
    pub filter: String,
}

impl LogSettings {
    /// Read `LOG_FORMAT` and `RUST_LOG`. Load `.env` before calling this.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            format: LogFormat::parse(lookup(LOG_FORMAT_ENV).as_deref()),
            filter: lookup(EnvFilter::DEFAULT_ENV)
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

/// Install the global subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(settings: &LogSettings) {
    let env_filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {:?}: {err}", settings.filter);
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match settings.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outbound mail collaborator.
//!
//! Delivery is external to this service. The default [`TracingMailer`]
//! records that a message would be sent; the reset token itself is never
//! written to the log.

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// Sends account emails.
pub trait Mailer: Send + Sync {
    /// Deliver a password-reset token to `to`.
    fn send_password_reset(&self, to: &str, token: &str) -> Result<(), MailError>;
}

/// A recipient that cannot be placed in a mail header as-is.
fn check_recipient(to: &str) -> Result<(), MailError> {
    if to.trim().is_empty() {
        return Err(MailError::Delivery("empty recipient".to_string()));
    }
    if to.chars().any(char::is_control) {
        return Err(MailError::Delivery("recipient contains control characters".to_string()));
    }
    Ok(())
}

/// Mailer that only logs the recipient.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMailer;

impl Mailer for TracingMailer {
    fn send_password_reset(&self, to: &str, _token: &str) -> Result<(), MailError> {
        check_recipient(to)?;
        info!(recipient = %to, "password reset email queued");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every message in memory so tests can read the token back.
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        pub(crate) fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Mailer for RecordingMailer {
        fn send_password_reset(&self, to: &str, token: &str) -> Result<(), MailError> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), token.to_string()));
            Ok(())
        }
    }

    #[test]
    fn tracing_mailer_accepts_messages() {
        assert!(TracingMailer.send_password_reset("a@example.com", "tok").is_ok());
    }

    #[test]
    fn tracing_mailer_rejects_unusable_recipients() {
        for to in ["", "   ", "a@example.com\r\nBcc: b@example.com"] {
            assert!(matches!(
                TracingMailer.send_password_reset(to, "tok"),
                Err(MailError::Delivery(_))
            ));
        }
    }

    #[test]
    fn recording_mailer_keeps_messages() {
        let mailer = RecordingMailer::default();
        mailer.send_password_reset("a@example.com", "tok").unwrap();
        assert_eq!(
            mailer.sent(),
            vec![("a@example.com".to_string(), "tok".to_string())]
        );
    }
}

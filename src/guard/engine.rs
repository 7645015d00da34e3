//! Login decision engine.
//!
//! Flow per attempt, stopping at the first terminal outcome:
//! 1) Reject requests without both identity and secret.
//! 2) Origin gate: blocked origins never reach credential verification.
//! 3) Account gate: suspended accounts never reach credential verification.
//! 4) Verify credentials. Success clears the account's failures; a mismatch
//!    records one and re-checks suspension so the attempt that crosses the
//!    threshold is told immediately.
//!
//! Storage errors abort the decision. There is no fallback to allow or deny.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::attempt_log::AttemptLog;
use super::clock::Clock;
use super::config::ProtectionConfig;
use super::credentials::CredentialStore;
use super::{ip_block, suspension};

#[derive(Clone, Debug, Default)]
pub struct LoginAttempt {
    pub identity: Option<String>,
    pub secret: Option<String>,
    pub origin: String,
}

impl LoginAttempt {
    #[must_use]
    pub fn new(identity: Option<String>, secret: Option<String>, origin: String) -> Self {
        Self {
            identity,
            secret,
            origin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Success {
        subject: String,
    },
    MalformedRequest,
    BlockedByOrigin,
    SuspendedAccount {
        minutes_remaining: u64,
        /// Set when this very attempt pushed the account over the threshold.
        tripped: bool,
    },
    InvalidCredentials,
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct StorageFailure(#[from] anyhow::Error);

pub struct LoginEngine {
    config: ProtectionConfig,
    credentials: Arc<dyn CredentialStore>,
    attempts: Arc<dyn AttemptLog>,
    clock: Arc<dyn Clock>,
}

impl LoginEngine {
    pub fn new(
        config: ProtectionConfig,
        credentials: Arc<dyn CredentialStore>,
        attempts: Arc<dyn AttemptLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config: config.normalize(),
            credentials,
            attempts,
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    #[must_use]
    pub fn attempts(&self) -> &dyn AttemptLog {
        self.attempts.as_ref()
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Decide one login attempt.
    ///
    /// # Errors
    /// Returns `StorageFailure` if any credential or attempt-log call fails.
    pub async fn login(&self, attempt: &LoginAttempt) -> Result<LoginOutcome, StorageFailure> {
        let Some((subject, secret)) = validate(attempt) else {
            debug!("Login rejected: missing email or password");
            return Ok(LoginOutcome::MalformedRequest);
        };

        let now = self.clock.now();
        let origin = attempt.origin.as_str();

        let block = ip_block::evaluate(self.attempts.as_ref(), &self.config, origin, now).await?;
        if block.is_blocked {
            warn!(origin, "Login rejected: origin blocked");
            return Ok(LoginOutcome::BlockedByOrigin);
        }

        let suspension =
            suspension::evaluate(self.attempts.as_ref(), &self.config, subject, now).await?;
        if suspension.is_suspended {
            warn!(
                origin,
                minutes_remaining = suspension.minutes_remaining,
                "Login rejected: account suspended"
            );
            return Ok(LoginOutcome::SuspendedAccount {
                minutes_remaining: suspension.minutes_remaining,
                tripped: false,
            });
        }

        if self.credentials.verify(subject, secret).await? {
            let cleared = self.attempts.clear(subject).await?;
            info!(origin, cleared, "Login successful");
            return Ok(LoginOutcome::Success {
                subject: subject.to_string(),
            });
        }

        let recorded = self.attempts.record(subject, origin, now).await?;
        debug!(origin, recorded, "Failed login attempt");

        let suspension =
            suspension::evaluate(self.attempts.as_ref(), &self.config, subject, now).await?;
        if suspension.is_suspended {
            warn!(
                origin,
                minutes_remaining = suspension.minutes_remaining,
                "Account suspended after failed attempt"
            );
            return Ok(LoginOutcome::SuspendedAccount {
                minutes_remaining: suspension.minutes_remaining,
                tripped: true,
            });
        }

        Ok(LoginOutcome::InvalidCredentials)
    }
}

/// Both fields present and non-empty. The identity is used exactly as sent.
fn validate(attempt: &LoginAttempt) -> Option<(&str, &str)> {
    let identity = attempt.identity.as_deref()?;
    let secret = attempt.secret.as_deref()?;
    if identity.is_empty() || secret.is_empty() {
        return None;
    }
    Some((identity, secret))
}

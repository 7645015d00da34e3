//! Append-only log of failed login attempts.
//!
//! Rows are keyed by subject (the account identity) and by origin address. A
//! row only ever exists for a subject known to the credential store at the
//! time of the failure, so the log cannot be flooded through nonexistent
//! accounts nor used to probe which accounts exist.
//!
//! Counts are always read from the backing store; nothing is cached in
//! process, so several replicas can share one database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedAttempt {
    pub subject: String,
    pub origin: String,
    pub occurred_at: DateTime<Utc>,
}

/// Count of matching events after a window start, plus the newest one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttemptStats {
    pub count: u64,
    pub last_attempt: Option<DateTime<Utc>>,
}

impl AttemptStats {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait AttemptLog: Send + Sync {
    /// Append a failed attempt for `subject`.
    ///
    /// Must not append when `subject` is unknown to the credential store.
    /// Returns whether a row was written.
    async fn record(&self, subject: &str, origin: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Events for `subject` strictly after `window_start`.
    async fn count_since(&self, subject: &str, window_start: DateTime<Utc>)
        -> Result<AttemptStats>;

    /// Number of events from `origin` strictly after `window_start`.
    async fn count_since_by_origin(&self, origin: &str, window_start: DateTime<Utc>)
        -> Result<u64>;

    /// Delete every event for `subject`. Returns the number of rows removed.
    async fn clear(&self, subject: &str) -> Result<u64>;

    /// Physically delete events at or before `cutoff`.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

//! In-process adapter for both storage seams.
//!
//! Used by tests and local runs without a database. Users and attempts share
//! one lock so `record` can check the subject exists atomically, the same way
//! the Postgres adapter does it in a single statement.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::attempt_log::{AttemptLog, AttemptStats, FailedAttempt};
use super::credentials::{CredentialStore, hash_password, secret_matches};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<String, String>,
    attempts: Vec<FailedAttempt>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `email` with the hash of `password`.
    pub async fn add_user(&self, email: &str, password: &str) {
        let mut inner = self.inner.lock().await;
        inner
            .users
            .insert(email.to_string(), hash_password(password));
    }

    /// Snapshot of every stored attempt, oldest first.
    pub async fn attempts(&self) -> Vec<FailedAttempt> {
        self.inner.lock().await.attempts.clone()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn exists(&self, identity: &str) -> Result<bool> {
        Ok(self.inner.lock().await.users.contains_key(identity))
    }

    async fn verify(&self, identity: &str, secret: &str) -> Result<bool> {
        let inner = self.inner.lock().await;
        Ok(secret_matches(
            inner.users.get(identity).map(String::as_str),
            secret,
        ))
    }
}

#[async_trait]
impl AttemptLog for MemoryStore {
    async fn record(&self, subject: &str, origin: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        if !inner.users.contains_key(subject) {
            return Ok(false);
        }
        inner.attempts.push(FailedAttempt {
            subject: subject.to_string(),
            origin: origin.to_string(),
            occurred_at: now,
        });
        Ok(true)
    }

    async fn count_since(
        &self,
        subject: &str,
        window_start: DateTime<Utc>,
    ) -> Result<AttemptStats> {
        let inner = self.inner.lock().await;
        let stats = inner
            .attempts
            .iter()
            .filter(|attempt| attempt.subject == subject && attempt.occurred_at > window_start)
            .fold(AttemptStats::none(), |stats, attempt| AttemptStats {
                count: stats.count + 1,
                last_attempt: stats.last_attempt.max(Some(attempt.occurred_at)),
            });
        Ok(stats)
    }

    async fn count_since_by_origin(
        &self,
        origin: &str,
        window_start: DateTime<Utc>,
    ) -> Result<u64> {
        let inner = self.inner.lock().await;
        let count = inner
            .attempts
            .iter()
            .filter(|attempt| attempt.origin == origin && attempt.occurred_at > window_start)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn clear(&self, subject: &str) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.attempts.len();
        inner.attempts.retain(|attempt| attempt.subject != subject);
        Ok(u64::try_from(before - inner.attempts.len()).unwrap_or(u64::MAX))
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.attempts.len();
        inner.attempts.retain(|attempt| attempt.occurred_at > cutoff);
        Ok(u64::try_from(before - inner.attempts.len()).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn record_skips_unknown_subjects() -> Result<()> {
        let store = MemoryStore::new();
        store.add_user("a@x.com", "secret").await;

        assert!(store.record("a@x.com", "1.2.3.4", t0()).await?);
        assert!(!store.record("ghost@x.com", "1.2.3.4", t0()).await?);

        let attempts = store.attempts().await;
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].subject, "a@x.com");
        Ok(())
    }

    #[tokio::test]
    async fn count_since_reports_latest_and_excludes_window_start() -> Result<()> {
        let store = MemoryStore::new();
        store.add_user("a@x.com", "secret").await;
        for minute in 0..4 {
            store
                .record("a@x.com", "1.2.3.4", t0() + Duration::minutes(minute))
                .await?;
        }

        let stats = store.count_since("a@x.com", t0() - Duration::seconds(1)).await?;
        assert_eq!(stats.count, 4);
        assert_eq!(stats.last_attempt, Some(t0() + Duration::minutes(3)));

        // An event exactly at the window start is outside the window.
        let stats = store.count_since("a@x.com", t0()).await?;
        assert_eq!(stats.count, 3);

        let stats = store.count_since("b@x.com", t0() - Duration::hours(1)).await?;
        assert_eq!(stats, AttemptStats::none());
        Ok(())
    }

    #[tokio::test]
    async fn origin_counts_span_subjects() -> Result<()> {
        let store = MemoryStore::new();
        store.add_user("a@x.com", "secret").await;
        store.add_user("b@x.com", "secret").await;
        store.record("a@x.com", "9.9.9.9", t0()).await?;
        store.record("b@x.com", "9.9.9.9", t0()).await?;
        store.record("b@x.com", "8.8.8.8", t0()).await?;

        let window_start = t0() - Duration::minutes(5);
        assert_eq!(store.count_since_by_origin("9.9.9.9", window_start).await?, 2);
        assert_eq!(store.count_since_by_origin("8.8.8.8", window_start).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_only_that_subject() -> Result<()> {
        let store = MemoryStore::new();
        store.add_user("a@x.com", "secret").await;
        store.add_user("b@x.com", "secret").await;
        store.record("a@x.com", "9.9.9.9", t0()).await?;
        store.record("a@x.com", "9.9.9.9", t0()).await?;
        store.record("b@x.com", "9.9.9.9", t0()).await?;

        assert_eq!(store.clear("a@x.com").await?, 2);
        let attempts = store.attempts().await;
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].subject, "b@x.com");
        Ok(())
    }

    #[tokio::test]
    async fn prune_before_drops_old_rows() -> Result<()> {
        let store = MemoryStore::new();
        store.add_user("a@x.com", "secret").await;
        store.record("a@x.com", "9.9.9.9", t0()).await?;
        store
            .record("a@x.com", "9.9.9.9", t0() + Duration::minutes(30))
            .await?;

        assert_eq!(store.prune_before(t0() + Duration::minutes(10)).await?, 1);
        assert_eq!(store.attempts().await.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn verify_checks_hash() -> Result<()> {
        let store = MemoryStore::new();
        store.add_user("a@x.com", "secret").await;

        assert!(store.exists("a@x.com").await?);
        assert!(!store.exists("ghost@x.com").await?);
        assert!(store.verify("a@x.com", "secret").await?);
        assert!(!store.verify("a@x.com", "wrong").await?);
        assert!(!store.verify("ghost@x.com", "secret").await?);
        Ok(())
    }
}

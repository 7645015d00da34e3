//! `PostgreSQL` adapter for the credential store and the attempt log.
//!
//! Tables are defined in `sql/schema.sql`. Every call goes to the database so
//! all service instances see the same counts.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::attempt_log::{AttemptLog, AttemptStats};
use super::credentials::{CredentialStore, secret_matches};

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn query_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn exists(&self, identity: &str) -> Result<bool> {
        let query = "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)";
        let row = sqlx::query(query)
            .bind(identity)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up user")?;
        Ok(row.get(0))
    }

    async fn verify(&self, identity: &str, secret: &str) -> Result<bool> {
        let query = "SELECT password_hash FROM users WHERE email = $1";
        let row = sqlx::query(query)
            .bind(identity)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to load password hash")?;

        let stored: Option<String> = row.map(|row| row.get("password_hash"));
        Ok(secret_matches(stored.as_deref(), secret))
    }
}

#[async_trait]
impl AttemptLog for PgStore {
    async fn record(&self, subject: &str, origin: &str, now: DateTime<Utc>) -> Result<bool> {
        // The existence check and the insert are one statement so a user
        // deleted concurrently never gains a row.
        let query = r"
            INSERT INTO failed_login_attempts (email, ip_address, attempted_at)
            SELECT $1::text, $2::text, $3::timestamptz
            WHERE EXISTS (SELECT 1 FROM users WHERE email = $1)
        ";
        let result = sqlx::query(query)
            .bind(subject)
            .bind(origin)
            .bind(now)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to record failed login attempt")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_since(
        &self,
        subject: &str,
        window_start: DateTime<Utc>,
    ) -> Result<AttemptStats> {
        let query = r"
            SELECT COUNT(*) AS attempt_count, MAX(attempted_at) AS last_attempt
            FROM failed_login_attempts
            WHERE email = $1 AND attempted_at > $2
        ";
        let row = sqlx::query(query)
            .bind(subject)
            .bind(window_start)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to count failed attempts for user")?;

        Ok(AttemptStats {
            count: to_count(row.get("attempt_count")),
            last_attempt: row.get("last_attempt"),
        })
    }

    async fn count_since_by_origin(
        &self,
        origin: &str,
        window_start: DateTime<Utc>,
    ) -> Result<u64> {
        let query = r"
            SELECT COUNT(*) AS attempt_count
            FROM failed_login_attempts
            WHERE ip_address = $1 AND attempted_at > $2
        ";
        let row = sqlx::query(query)
            .bind(origin)
            .bind(window_start)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to count failed attempts for origin")?;
        Ok(to_count(row.get("attempt_count")))
    }

    async fn clear(&self, subject: &str) -> Result<u64> {
        let query = "DELETE FROM failed_login_attempts WHERE email = $1";
        let result = sqlx::query(query)
            .bind(subject)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to clear failed attempts")?;
        Ok(result.rows_affected())
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let query = "DELETE FROM failed_login_attempts WHERE attempted_at <= $1";
        let result = sqlx::query(query)
            .bind(cutoff)
            .execute(&self.pool)
            .instrument(query_span("DELETE", query))
            .await
            .context("failed to prune failed attempts")?;
        Ok(result.rows_affected())
    }
}

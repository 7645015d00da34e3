//! Per-account suspension evaluator.
//!
//! An account is suspended once it has `user_threshold` or more failures in
//! the trailing `user_window`, and stays suspended until `suspension_duration`
//! has passed since the newest of those failures.

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::attempt_log::AttemptLog;
use super::config::ProtectionConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuspensionDecision {
    pub is_suspended: bool,
    pub minutes_remaining: u64,
}

impl SuspensionDecision {
    #[must_use]
    pub fn clear() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn suspended(minutes_remaining: u64) -> Self {
        Self {
            is_suspended: true,
            minutes_remaining,
        }
    }
}

/// Evaluate whether `subject` is locked out at `now`.
///
/// # Errors
/// Returns an error if the attempt log cannot be read.
pub async fn evaluate(
    log: &dyn AttemptLog,
    config: &ProtectionConfig,
    subject: &str,
    now: DateTime<Utc>,
) -> Result<SuspensionDecision> {
    let window_start = now - config.user_window();
    let stats = log.count_since(subject, window_start).await?;

    if stats.count < u64::from(config.user_threshold()) {
        return Ok(SuspensionDecision::clear());
    }

    let Some(last_attempt) = stats.last_attempt else {
        return Ok(SuspensionDecision::clear());
    };

    let suspension_end = last_attempt + config.suspension_duration();
    if now < suspension_end {
        let remaining_seconds = (suspension_end - now).num_seconds().max(0);
        let minutes_remaining = u64::try_from(remaining_seconds / 60).unwrap_or(0);
        Ok(SuspensionDecision::suspended(minutes_remaining))
    } else {
        Ok(SuspensionDecision::clear())
    }
}

//! Per-origin block evaluator.
//!
//! A block has no expiry of its own: it lifts once enough failures age out of
//! the trailing `ip_window` for the count to drop below `ip_threshold`.

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::attempt_log::AttemptLog;
use super::config::ProtectionConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockDecision {
    pub is_blocked: bool,
}

/// Evaluate whether `origin` is blocked at `now`.
///
/// # Errors
/// Returns an error if the attempt log cannot be read.
pub async fn evaluate(
    log: &dyn AttemptLog,
    config: &ProtectionConfig,
    origin: &str,
    now: DateTime<Utc>,
) -> Result<BlockDecision> {
    let window_start = now - config.ip_window();
    let count = log.count_since_by_origin(origin, window_start).await?;
    Ok(BlockDecision {
        is_blocked: count >= u64::from(config.ip_threshold()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::guard::memory::MemoryStore;
    use chrono::{Duration, TimeZone};

    const ORIGIN: &str = "9.9.9.9";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    async fn store_with_failures(count: usize) -> Result<MemoryStore> {
        let store = MemoryStore::new();
        for index in 0..count {
            let email = format!("user{index}@x.com");
            store.add_user(&email, "secret").await;
            store.record(&email, ORIGIN, t0()).await?;
        }
        Ok(store)
    }

    #[tokio::test]
    async fn below_threshold_is_not_blocked() -> Result<()> {
        let store = store_with_failures(99).await?;
        let decision = evaluate(&store, &ProtectionConfig::new(), ORIGIN, t0()).await?;
        assert!(!decision.is_blocked);
        Ok(())
    }

    #[tokio::test]
    async fn threshold_blocks() -> Result<()> {
        let store = store_with_failures(100).await?;
        let decision = evaluate(
            &store,
            &ProtectionConfig::new(),
            ORIGIN,
            t0() + Duration::minutes(4),
        )
        .await?;
        assert!(decision.is_blocked);

        let decision = evaluate(&store, &ProtectionConfig::new(), "8.8.8.8", t0()).await?;
        assert!(!decision.is_blocked);
        Ok(())
    }

    #[tokio::test]
    async fn block_lifts_as_window_slides() -> Result<()> {
        let store = store_with_failures(100).await?;
        let decision = evaluate(
            &store,
            &ProtectionConfig::new(),
            ORIGIN,
            t0() + Duration::minutes(5),
        )
        .await?;
        assert_eq!(decision, BlockDecision::default());
        Ok(())
    }

    #[tokio::test]
    async fn custom_threshold() -> Result<()> {
        let store = store_with_failures(3).await?;
        let config = ProtectionConfig::new().with_ip_threshold(3);
        assert!(evaluate(&store, &config, ORIGIN, t0()).await?.is_blocked);
        Ok(())
    }
}

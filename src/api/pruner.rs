//! Background removal of failed attempts too old to affect any decision.
//!
//! Every window and the suspension period are bounded by
//! `ProtectionConfig::retention`, so rows older than that are dead weight.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error};

use crate::guard::{AttemptLog, Clock, ProtectionConfig};

pub fn spawn_prune_worker(
    log: Arc<dyn AttemptLog>,
    clock: Arc<dyn Clock>,
    protection: ProtectionConfig,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;

            match prune_once(log.as_ref(), clock.as_ref(), &protection).await {
                Ok(removed) => debug!(removed, "Pruned stale failed attempts"),
                Err(err) => error!("failed attempt pruning failed: {err:#}"),
            }
        }
    })
}

async fn prune_once(
    log: &dyn AttemptLog,
    clock: &dyn Clock,
    protection: &ProtectionConfig,
) -> Result<u64> {
    let cutoff = clock.now() - protection.retention();
    log.prune_before(cutoff).await
}

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::funding::FundingSessionManager;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Background pass that marks overdue funding sessions as `expired`.
/// Spawned once at startup; it never exits.
pub fn spawn(manager: Arc<FundingSessionManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match manager.expire_due().await {
                Ok(0) => {}
                Ok(count) => info!(count, "expired overdue funding sessions"),
                Err(err) => error!(%err, "funding session expiry sweep failed"),
            }
        }
    })
}

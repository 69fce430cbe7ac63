//! Background maintenance loop for the token store.
//! Uses tokio::interval: sleeps between sweeps, zero work when idle.

use std::sync::Arc;
use std::time::Duration;

use bazaar_core::TaskTokenStore;
use tokio::task::JoinHandle;

/// Spawn a task that drops expired tokens every `every`.
pub fn spawn_token_reaper(store: Arc<dyn TaskTokenStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Token reaper started (sweep every {}s)", every.as_secs());
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Purged {n} expired confirmation token(s)"),
                Err(e) => tracing::warn!("Token purge failed: {e}"),
            }
        }
    })
}

//! # Bazaar Channels
//! Outbound message writers. Each implements
//! [`MessageWriter`](bazaar_core::MessageWriter): `send_now` delivers
//! immediately, `send_later` holds a single message on a detached tokio task
//! until its ETA.

pub mod email;
pub mod telegram;

pub use email::EmailWriter;
pub use telegram::TelegramWriter;

use std::future::Future;
use std::time::Duration;

use bazaar_core::Result;

/// Run `send` after `eta` on a detached task. Failures are logged, not retried.
pub(crate) fn deliver_after<F>(channel: &'static str, address: String, eta: Duration, send: F)
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    tracing::info!("Scheduled {channel} message to {address} in {}s", eta.as_secs());
    tokio::spawn(async move {
        tokio::time::sleep(eta).await;
        if let Err(e) = send.await {
            tracing::warn!("Delayed {channel} message to {address} failed: {e}");
        }
    });
}

//! Contracts of the external collaborators the core consumes.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::action::{ActionKind, TaskArgs, TaskToken};
use crate::error::Result;

/// A task as handed back by [`TaskTokenStore::take`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTask {
    pub token: TaskToken,
    pub kind: ActionKind,
    pub args: TaskArgs,
    pub created_at: DateTime<Utc>,
}

/// Durable keyed storage of pending actions.
///
/// `take` must retrieve and delete the record in one atomic step: of any
/// number of concurrent `take` calls for the same token, exactly one
/// observes the record and the rest get `TokenNotFound`.
#[async_trait]
pub trait TaskTokenStore: Send + Sync {
    /// Persist a new record under a freshly minted token. Never overwrites.
    async fn put(&self, args: &TaskArgs) -> Result<TaskToken>;

    /// Atomically read and delete. Absent, consumed and expired tokens all
    /// fail with `BazaarError::TokenNotFound`.
    async fn take(&self, token: &TaskToken) -> Result<StoredTask>;

    /// Drop expired records. Stores without expiry return 0.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
}

/// Outbound message transport (mail, telegram, ...).
#[async_trait]
pub trait MessageWriter: Send + Sync {
    /// Channel name, used in logs and confirmation prompts.
    fn name(&self) -> &str;

    async fn send_now(&self, text: &str, address: &str) -> Result<()>;

    /// Hand a single message to the channel for delivery after `eta`.
    async fn send_later(&self, text: &str, address: &str, eta: Duration) -> Result<()>;
}

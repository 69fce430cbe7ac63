//! In-memory task token store.
//! Single process only; pending links vanish on restart. Used for tests and
//! the `memory` backend.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bazaar_core::{BazaarError, Result, StoredTask, TaskArgs, TaskToken, TaskTokenStore};
use chrono::Utc;

/// Memory-backed store. `take` is a single `remove` under the lock.
pub struct MemoryTaskStore {
    tasks: Mutex<HashMap<TaskToken, StoredTask>>,
    ttl: Option<Duration>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            ttl: None,
        }
    }

    /// Tokens older than `ttl` are reported as not found.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tasks: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<TaskToken, StoredTask>>> {
        self.tasks
            .lock()
            .map_err(|e| BazaarError::Store(format!("Lock: {e}")))
    }

    fn is_expired(&self, task: &StoredTask) -> bool {
        is_expired(self.ttl, task)
    }
}

pub(crate) fn is_expired(ttl: Option<Duration>, task: &StoredTask) -> bool {
    let Some(ttl) = ttl else { return false };
    let age = Utc::now().signed_duration_since(task.created_at);
    age.to_std().map(|a| a > ttl).unwrap_or(false)
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskTokenStore for MemoryTaskStore {
    async fn put(&self, args: &TaskArgs) -> Result<TaskToken> {
        let mut tasks = self.lock()?;
        let token = TaskToken::new();
        if tasks.contains_key(&token) {
            return Err(BazaarError::Store(format!("token collision on {token}")));
        }
        tasks.insert(
            token,
            StoredTask {
                token,
                kind: args.kind(),
                args: args.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(token)
    }

    async fn take(&self, token: &TaskToken) -> Result<StoredTask> {
        let task = self
            .lock()?
            .remove(token)
            .ok_or_else(|| BazaarError::TokenNotFound(token.to_string()))?;
        if self.is_expired(&task) {
            tracing::debug!("Token {token} expired");
            return Err(BazaarError::TokenNotFound(token.to_string()));
        }
        Ok(task)
    }

    async fn purge_expired(&self) -> Result<usize> {
        if self.ttl.is_none() {
            return Ok(0);
        }
        let mut tasks = self.lock()?;
        let before = tasks.len();
        tasks.retain(|_, t| !is_expired(self.ttl, t));
        Ok(before - tasks.len())
    }
}

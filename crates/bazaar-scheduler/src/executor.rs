//! Late executor: run an action later, when the recipient follows a link.
//!
//! ```text
//! usecase ──enqueue(args)──▶ TaskTokenStore.put ──▶ token ──▶ {domain}/confirm/{token}
//!
//! GET /confirm/{token} ──dispatch(token)──▶ TaskTokenStore.take   (atomic read+delete)
//!                                       └─▶ ActionRegistry.resolve(kind) ──▶ handler(ctx, args)
//! ```
//!
//! Dispatch runs the handler inline, on the caller's task. The token is
//! consumed before the handler starts: a failing handler leaves a dead link
//! and is not retried.

use std::sync::Arc;

use bazaar_core::{ActionKind, BazaarError, Result, TaskArgs, TaskToken, TaskTokenStore};

use crate::registry::ActionRegistry;

pub struct LateExecutor<C> {
    registry: ActionRegistry<C>,
    store: Arc<dyn TaskTokenStore>,
}

impl<C: Send + Sync> LateExecutor<C> {
    /// Takes ownership of the finished registry: no handler can be bound
    /// once the executor exists.
    pub fn new(registry: ActionRegistry<C>, store: Arc<dyn TaskTokenStore>) -> Self {
        tracing::info!("Late executor ready with {} action(s)", registry.len());
        Self { registry, store }
    }

    pub fn registry(&self) -> &ActionRegistry<C> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn TaskTokenStore> {
        &self.store
    }

    /// Store `args` and return the token that will trigger them.
    pub async fn enqueue(&self, args: TaskArgs) -> Result<TaskToken> {
        let kind = args.kind();
        if !self.registry.contains(kind) {
            tracing::warn!("Enqueueing '{kind}' which has no handler bound yet");
        }
        let token = self.store.put(&args).await?;
        tracing::debug!("Enqueued '{kind}' as {token}");
        Ok(token)
    }

    /// Consume `token` and run its handler. Succeeds at most once per token.
    pub async fn dispatch(&self, token: &TaskToken, ctx: &C) -> Result<ActionKind> {
        let task = match self.store.take(token).await {
            Ok(task) => task,
            Err(e @ BazaarError::TokenNotFound(_)) => {
                tracing::warn!("Dispatch of unknown or used token {token}");
                return Err(e);
            }
            Err(e) => {
                tracing::error!("Dispatch of {token} failed reading the task store: {e}");
                return Err(e);
            }
        };

        let kind = task.kind;
        let handler = self.registry.resolve(kind).inspect_err(|e| {
            tracing::error!("Token {token} references an unbound action: {e}");
        })?;

        match handler.handle(ctx, task.args).await {
            Ok(()) => {
                tracing::info!("Dispatched '{kind}' for token {token}");
                Ok(kind)
            }
            Err(e) => {
                // The token is gone; the user has to restart the flow.
                tracing::error!("Handler '{kind}' failed for consumed token {token}: {e}");
                Err(e)
            }
        }
    }
}

//! Action registry: binds each [`ActionKind`] to the handler that runs it.
//!
//! Built once at the composition root, then moved into a
//! [`LateExecutor`](crate::LateExecutor). There is no way to write to it
//! afterwards, so concurrent lookups need no synchronisation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bazaar_core::{ActionKind, BazaarError, Result, TaskArgs};

/// A named deferred action. `C` is the context carrying the handler's
/// dependencies (repositories, notifiers, ...), passed in on every call.
#[async_trait]
pub trait ActionHandler<C>: Send + Sync {
    async fn handle(&self, ctx: &C, args: TaskArgs) -> Result<()>;
}

/// Registry of all bound actions.
pub struct ActionRegistry<C> {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler<C>>>,
}

impl<C: Send + Sync> ActionRegistry<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Bind `handler` to `kind`. Binding the same kind twice is a
    /// composition bug and fails with `DuplicateAction`.
    pub fn register<H>(&mut self, kind: ActionKind, handler: H) -> Result<()>
    where
        H: ActionHandler<C> + 'static,
    {
        if self.handlers.contains_key(&kind) {
            return Err(BazaarError::DuplicateAction(kind.to_string()));
        }
        tracing::debug!("Registered action handler: {kind}");
        self.handlers.insert(kind, Arc::new(handler));
        Ok(())
    }

    pub fn resolve(&self, kind: ActionKind) -> Result<Arc<dyn ActionHandler<C>>> {
        self.handlers
            .get(&kind)
            .cloned()
            .ok_or_else(|| BazaarError::ActionNotRegistered(kind.to_string()))
    }

    pub fn contains(&self, kind: ActionKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Bound kinds, sorted by name.
    pub fn kinds(&self) -> Vec<ActionKind> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<C: Send + Sync> Default for ActionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

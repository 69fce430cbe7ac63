//! Everything an action handler or usecase needs, passed explicitly.

use std::sync::Arc;

use bazaar_core::{Address, BazaarError, Result, TaskTokenStore};
use bazaar_scheduler::{ActionRegistry, LateExecutor, Notifier};

use crate::hasher::PasswordHasher;
use crate::repo::{GoodRepo, UserRepo};

pub type AccountsExecutor = LateExecutor<AccountsContext>;

pub struct AccountsContext {
    pub users: Arc<dyn UserRepo>,
    pub goods: Arc<dyn GoodRepo>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub mail: Option<Notifier<AccountsContext>>,
    pub telegram: Option<Notifier<AccountsContext>>,
}

impl AccountsContext {
    /// The notifier serving `address`'s channel.
    pub fn notifier_for(&self, address: &Address) -> Result<&Notifier<AccountsContext>> {
        let notifier = match address {
            Address::Email(_) => self.mail.as_ref(),
            Address::Telegram(_) => self.telegram.as_ref(),
        };
        notifier.ok_or_else(|| {
            BazaarError::Config(format!("{} channel is not configured", address.channel()))
        })
    }
}

/// Executor with every account action bound.
pub fn build_executor(store: Arc<dyn TaskTokenStore>) -> Result<Arc<AccountsExecutor>> {
    let mut registry = ActionRegistry::new();
    crate::actions::register_all(&mut registry)?;
    Ok(Arc::new(LateExecutor::new(registry, store)))
}

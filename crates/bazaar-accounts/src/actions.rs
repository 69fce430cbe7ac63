//! Handlers run when a confirmation link is followed.

use async_trait::async_trait;
use bazaar_core::{ActionKind, Address, BazaarError, Result, TaskArgs};
use bazaar_scheduler::{ActionHandler, ActionRegistry};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::context::AccountsContext;

const RESET_PASSWORD_LEN: usize = 20;

fn mismatch(expected: ActionKind, got: &TaskArgs) -> BazaarError {
    BazaarError::Payload(format!("{expected} handler got {} arguments", got.kind()))
}

fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Marks a freshly registered user active.
pub struct ActivateUserHandler;

#[async_trait]
impl ActionHandler<AccountsContext> for ActivateUserHandler {
    async fn handle(&self, ctx: &AccountsContext, args: TaskArgs) -> Result<()> {
        let TaskArgs::ActivateUser { user_id } = args else {
            return Err(mismatch(ActionKind::ActivateUser, &args));
        };
        let user = ctx.users.activate(user_id).await?;
        tracing::info!("Activated user '{}' ({})", user.name, user.id);
        Ok(())
    }
}

/// Persists the user record captured when the link was issued.
pub struct UpdateUserHandler;

#[async_trait]
impl ActionHandler<AccountsContext> for UpdateUserHandler {
    async fn handle(&self, ctx: &AccountsContext, args: TaskArgs) -> Result<()> {
        match args {
            TaskArgs::UpdateUser { user } => {
                let user = ctx.users.update_user(user).await?;
                tracing::info!("Updated user '{}' ({})", user.name, user.id);
                Ok(())
            }
            other => Err(mismatch(ActionKind::UpdateUser, &other)),
        }
    }
}

/// Generates a new password and sends it in plain text on the user's
/// preferred channel.
pub struct ResetPasswordHandler;

#[async_trait]
impl ActionHandler<AccountsContext> for ResetPasswordHandler {
    async fn handle(&self, ctx: &AccountsContext, args: TaskArgs) -> Result<()> {
        let mut user = match args {
            TaskArgs::ResetPassword { user } => user,
            other => return Err(mismatch(ActionKind::ResetPassword, &other)),
        };
        let address = user
            .preferred_address()
            .ok_or(BazaarError::NoConfirmationSource)?;
        let notifier = ctx.notifier_for(&address)?;

        let password = random_password();
        user.hashed_password = ctx.hasher.hash(&password)?;
        let user = ctx.users.update_user(user).await?;
        notifier
            .notify(address.value(), &format!("Your new password is {password}"), None)
            .await?;
        tracing::info!("Reset password for '{}' via {}", user.name, address.channel());
        Ok(())
    }
}

/// First step of changing a confirmation source: the old address agreed,
/// now the new one must prove itself.
pub struct UpdateConfirmationSourceHandler;

#[async_trait]
impl ActionHandler<AccountsContext> for UpdateConfirmationSourceHandler {
    async fn handle(&self, ctx: &AccountsContext, args: TaskArgs) -> Result<()> {
        let (mut user, email, telegram) = match args {
            TaskArgs::UpdateConfirmationSource { user, email, telegram } => (user, email, telegram),
            other => return Err(mismatch(ActionKind::UpdateConfirmationSource, &other)),
        };
        let address = match (email, telegram) {
            (Some(email), _) => {
                if ctx.users.is_mail_used(&email).await? {
                    return Err(BazaarError::ConfirmationInUse {
                        channel: "email".into(),
                        value: email,
                    });
                }
                user.email = Some(email.clone());
                Address::Email(email)
            }
            (None, Some(telegram)) => {
                if ctx.users.is_telegram_used(&telegram).await? {
                    return Err(BazaarError::ConfirmationInUse {
                        channel: "telegram".into(),
                        value: telegram,
                    });
                }
                user.telegram = Some(telegram.clone());
                Address::Telegram(telegram)
            }
            (None, None) => {
                return Err(BazaarError::Validation("no new confirmation source given".into()));
            }
        };
        ctx.notifier_for(&address)?
            .confirm_address(address.value(), TaskArgs::UpdateUser { user })
            .await?;
        Ok(())
    }
}

/// Bind every account action.
pub fn register_all(registry: &mut ActionRegistry<AccountsContext>) -> Result<()> {
    registry.register(ActionKind::ActivateUser, ActivateUserHandler)?;
    registry.register(ActionKind::UpdateUser, UpdateUserHandler)?;
    registry.register(ActionKind::ResetPassword, ResetPasswordHandler)?;
    registry.register(ActionKind::UpdateConfirmationSource, UpdateConfirmationSourceHandler)?;
    Ok(())
}

//! User-facing account operations.

use std::sync::Arc;

use bazaar_core::{
    ActiveWindow, BazaarError, ContactMessage, Result, TaskArgs, TaskToken, User,
};
use bazaar_scheduler::{Delivery, NotificationScheduler};
use uuid::Uuid;

use crate::context::AccountsContext;

pub struct UserUsecase {
    ctx: Arc<AccountsContext>,
}

impl UserUsecase {
    pub fn new(ctx: Arc<AccountsContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<AccountsContext> {
        &self.ctx
    }

    async fn ensure_unused(&self, user: &User) -> Result<()> {
        if let Some(email) = &user.email {
            if self.ctx.users.is_mail_used(email).await? {
                return Err(BazaarError::ConfirmationInUse {
                    channel: "email".into(),
                    value: email.clone(),
                });
            }
        }
        if let Some(telegram) = &user.telegram {
            if self.ctx.users.is_telegram_used(telegram).await? {
                return Err(BazaarError::ConfirmationInUse {
                    channel: "telegram".into(),
                    value: telegram.clone(),
                });
            }
        }
        Ok(())
    }

    /// Ask the user, on their preferred channel, to confirm an action.
    async fn ask(&self, user: &User, prompt: &str, args: TaskArgs) -> Result<TaskToken> {
        let address = user
            .preferred_address()
            .ok_or(BazaarError::NoConfirmationSource)?;
        self.ctx
            .notifier_for(&address)?
            .ask(address.value(), prompt, args)
            .await
    }

    /// Store the user as non-active and send an activation link.
    pub async fn register_user(&self, mut user: User, password: &str) -> Result<User> {
        let address = user
            .preferred_address()
            .ok_or(BazaarError::NoConfirmationSource)?;
        let notifier = self.ctx.notifier_for(&address)?;
        self.ensure_unused(&user).await?;

        user.hashed_password = self.ctx.hasher.hash(password)?;
        user.active = false;
        let user = self.ctx.users.add_nonactive(user).await?;
        notifier
            .confirm_address(address.value(), TaskArgs::ActivateUser { user_id: user.id })
            .await?;
        tracing::info!("Registered '{}' pending {} confirmation", user.name, address.channel());
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.ctx.users.get_user(id).await
    }

    pub async fn update_user_info(
        &self,
        id: Uuid,
        name: Option<String>,
        active_time: Option<ActiveWindow>,
    ) -> Result<User> {
        self.ctx.users.update_user_info(id, name, active_time).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<TaskToken> {
        let mut user = self.ctx.users.get_user(user_id).await?;
        if !self.ctx.hasher.verify(old_password, &user.hashed_password)? {
            return Err(BazaarError::IncorrectOldPassword);
        }
        user.hashed_password = self.ctx.hasher.hash(new_password)?;
        let prompt = "Confirm updating your password";
        let args = TaskArgs::UpdateUser { user: user.clone() };
        self.ask(&user, prompt, args).await
    }

    pub async fn reset_password(&self, username: &str) -> Result<TaskToken> {
        let user = self.ctx.users.get_by_username(username).await?;
        let prompt = "Confirm resetting your password";
        let args = TaskArgs::ResetPassword { user: user.clone() };
        self.ask(&user, prompt, args).await
    }

    /// Starts the two-step change: the current address approves, then the
    /// new one confirms.
    pub async fn update_confirmation(
        &self,
        user_id: Uuid,
        email: Option<String>,
        telegram: Option<String>,
    ) -> Result<TaskToken> {
        if email.is_none() && telegram.is_none() {
            return Err(BazaarError::Validation("no new confirmation source given".into()));
        }
        let user = self.ctx.users.get_user(user_id).await?;
        let prompt = "Confirm updating your confirmation source";
        let args = TaskArgs::UpdateConfirmationSource {
            user: user.clone(),
            email,
            telegram,
        };
        self.ask(&user, prompt, args).await
    }

    /// Forward a buyer's message to every channel of the good's owner.
    pub async fn message_owner(&self, message: &ContactMessage) -> Result<Vec<Delivery>> {
        self.message_owner_at(message, NotificationScheduler::current_hour())
            .await
    }

    pub async fn message_owner_at(&self, message: &ContactMessage, hour: u8) -> Result<Vec<Delivery>> {
        let good = self.ctx.goods.get_good(message.good_id).await?;
        let owner = self.ctx.users.get_user(good.owner_id).await?;
        let sender = self.ctx.users.get_user(message.sender).await?;
        let text = format!(
            "New message on {} topic received from {}:\n{}\nContact them on: {}",
            good.name, sender.name, message.message, message.contact_info
        );

        let addresses = owner.addresses();
        if addresses.is_empty() {
            return Err(BazaarError::NoConfirmationSource);
        }
        let mut deliveries = Vec::with_capacity(addresses.len());
        for address in &addresses {
            let notifier = match self.ctx.notifier_for(address) {
                Ok(n) => n,
                Err(e) => {
                    tracing::warn!("Skipping {} for owner '{}': {e}", address.channel(), owner.name);
                    continue;
                }
            };
            let delivery = notifier
                .notify_at(address.value(), &text, owner.active_time.as_ref(), hour)
                .await?;
            deliveries.push(delivery);
        }
        Ok(deliveries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use bazaar_core::{ActionKind, Good};
    use std::time::Duration;

    fn usecase(h: &Harness) -> UserUsecase {
        UserUsecase::new(h.ctx.clone())
    }

    #[tokio::test]
    async fn test_register_then_activate_via_link() {
        let h = Harness::new();
        let uc = usecase(&h);
        let user = uc
            .register_user(Harness::user("ann", Some("ann@example.com"), Some("@ann")), "pw")
            .await
            .unwrap();
        assert!(!user.active);
        assert!(h.telegram.sent().is_empty());
        let sent = h.mail.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].address, "ann@example.com");
        assert!(sent[0].text.starts_with("Please, follow the link to confirm your email address: https://bazaar.example/confirm/"));

        let token = h.mail.last_token();
        assert_eq!(h.follow(&token).await.unwrap(), ActionKind::ActivateUser);
        assert!(uc.get_user(user.id).await.unwrap().active);
        assert!(matches!(h.follow(&token).await, Err(BazaarError::TokenNotFound(_))));
    }

    #[tokio::test]
    async fn test_register_telegram_only() {
        let h = Harness::new();
        usecase(&h)
            .register_user(Harness::user("bob", None, Some("@bob")), "pw")
            .await
            .unwrap();
        assert!(h.mail.sent().is_empty());
        assert!(h.telegram.sent()[0].text.contains("confirm your telegram address"));
    }

    #[tokio::test]
    async fn test_register_requires_a_source() {
        let h = Harness::new();
        let err = usecase(&h)
            .register_user(Harness::user("cat", None, None), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, BazaarError::NoConfirmationSource));
    }

    #[tokio::test]
    async fn test_register_rejects_used_address_before_insert() {
        let h = Harness::new();
        h.insert_user("dan", Some("dan@example.com"), None).await;
        let err = usecase(&h)
            .register_user(Harness::user("dan2", Some("dan@example.com"), None), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, BazaarError::ConfirmationInUse { ref channel, .. } if channel == "email"));
        assert!(h.ctx.users.get_by_username("dan2").await.is_err());
        assert!(h.mail.sent().is_empty());
    }

    #[tokio::test]
    async fn test_change_password_applies_only_after_confirmation() {
        let h = Harness::new();
        let uc = usecase(&h);
        let user = h.insert_user("eve", Some("eve@example.com"), None).await;

        assert!(matches!(
            uc.change_password(user.id, "wrong", "new").await,
            Err(BazaarError::IncorrectOldPassword)
        ));

        let token = uc.change_password(user.id, "secret", "n3w").await.unwrap();
        assert!(h.mail.sent()[0].text.starts_with("Please, follow the link to \"Confirm updating your password\": "));
        let before = uc.get_user(user.id).await.unwrap();
        assert!(h.ctx.hasher.verify("secret", &before.hashed_password).unwrap());

        h.follow(&token).await.unwrap();
        let after = uc.get_user(user.id).await.unwrap();
        assert!(h.ctx.hasher.verify("n3w", &after.hashed_password).unwrap());
    }

    #[tokio::test]
    async fn test_reset_password_flow() {
        let h = Harness::new();
        let uc = usecase(&h);
        let user = h.insert_user("fin", Some("fin@example.com"), None).await;
        let token = uc.reset_password("fin").await.unwrap();
        h.follow(&token).await.unwrap();

        let sent = h.mail.sent();
        assert_eq!(sent.len(), 2);
        let password = sent[1].text.strip_prefix("Your new password is ").unwrap();
        assert_eq!(password.len(), 20);
        let stored = uc.get_user(user.id).await.unwrap();
        assert!(h.ctx.hasher.verify(password, &stored.hashed_password).unwrap());
    }

    #[tokio::test]
    async fn test_reset_password_unknown_user() {
        let h = Harness::new();
        assert!(matches!(
            usecase(&h).reset_password("ghost").await,
            Err(BazaarError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_confirmation_is_two_step() {
        let h = Harness::new();
        let uc = usecase(&h);
        let user = h.insert_user("gia", Some("gia@example.com"), None).await;

        let first = uc
            .update_confirmation(user.id, None, Some("@gia".into()))
            .await
            .unwrap();
        assert_eq!(h.mail.sent()[0].address, "gia@example.com");
        h.follow(&first).await.unwrap();
        assert_eq!(uc.get_user(user.id).await.unwrap().telegram, None);

        let sent = h.telegram.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].address, "@gia");
        let second = h.telegram.last_token();
        assert_eq!(h.follow(&second).await.unwrap(), ActionKind::UpdateUser);
        assert_eq!(uc.get_user(user.id).await.unwrap().telegram.as_deref(), Some("@gia"));
    }

    #[tokio::test]
    async fn test_update_confirmation_needs_new_address() {
        let h = Harness::new();
        let user = h.insert_user("hub", Some("hub@example.com"), None).await;
        assert!(matches!(
            usecase(&h).update_confirmation(user.id, None, None).await,
            Err(BazaarError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_message_owner_respects_window_on_every_channel() {
        let h = Harness::new();
        let uc = usecase(&h);
        let owner = h.insert_user("ida", Some("ida@example.com"), Some("@ida")).await;
        let owner = uc
            .update_user_info(owner.id, None, Some(ActiveWindow::new(9, 17).unwrap()))
            .await
            .unwrap();
        let buyer = h.insert_user("jon", Some("jon@example.com"), None).await;
        let good = Good { id: Uuid::new_v4(), name: "Bike".into(), owner_id: owner.id };
        h.goods.insert(good.clone()).unwrap();

        let msg = ContactMessage {
            good_id: good.id,
            sender: buyer.id,
            message: "Still available?".into(),
            contact_info: "+100".into(),
        };
        let deliveries = uc.message_owner_at(&msg, 20).await.unwrap();
        let eta = Duration::from_secs(13 * 3600);
        assert_eq!(deliveries, vec![Delivery::Later { eta }, Delivery::Later { eta }]);
        assert_eq!(
            h.mail.sent()[0].text,
            "New message on Bike topic received from jon:\nStill available?\nContact them on: +100"
        );
        assert_eq!(h.telegram.sent()[0].eta, Some(eta));

        let now = uc.message_owner_at(&msg, 10).await.unwrap();
        assert_eq!(now, vec![Delivery::Now, Delivery::Now]);
    }

    #[tokio::test]
    async fn test_message_owner_unknown_good() {
        let h = Harness::new();
        let msg = ContactMessage {
            good_id: Uuid::new_v4(),
            sender: Uuid::new_v4(),
            message: "hi".into(),
            contact_info: "x".into(),
        };
        assert!(matches!(
            usecase(&h).message_owner_at(&msg, 0).await,
            Err(BazaarError::GoodNotFound(_))
        ));
    }
}

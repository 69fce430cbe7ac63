//! Notifier: one delivery channel plus the executor, offering the three
//! things usecases need: confirm an address, ask for confirmation of an
//! action, and notify within the recipient's active hours.

use std::sync::Arc;

use bazaar_core::{ActiveWindow, MessageWriter, Result, TaskArgs, TaskToken};

use crate::executor::LateExecutor;
use crate::window::{Delivery, NotificationScheduler};

pub const CONFIRM_PREFIX: &str = "/confirm/";

pub struct Notifier<C> {
    writer: Arc<dyn MessageWriter>,
    executor: Arc<LateExecutor<C>>,
    domain: String,
}

impl<C: Send + Sync> Notifier<C> {
    pub fn new(writer: Arc<dyn MessageWriter>, executor: Arc<LateExecutor<C>>, domain: &str) -> Self {
        Self {
            writer,
            executor,
            domain: domain.trim_end_matches('/').to_string(),
        }
    }

    pub fn channel(&self) -> &str {
        self.writer.name()
    }

    pub fn confirmation_url(&self, token: &TaskToken) -> String {
        format!("{}{CONFIRM_PREFIX}{token}", self.domain)
    }

    async fn link(&self, args: TaskArgs) -> Result<(TaskToken, String)> {
        let token = self.executor.enqueue(args).await?;
        let url = self.confirmation_url(&token);
        Ok((token, url))
    }

    /// Send a link that proves `address` belongs to the recipient.
    pub async fn confirm_address(&self, address: &str, args: TaskArgs) -> Result<TaskToken> {
        let (token, url) = self.link(args).await?;
        let text = format!(
            "Please, follow the link to confirm your {} address: {url}",
            self.channel()
        );
        self.writer.send_now(&text, address).await?;
        tracing::info!("Sent {} address confirmation to {address}", self.channel());
        Ok(token)
    }

    /// Send a link that confirms the action described by `prompt`.
    pub async fn ask(&self, address: &str, prompt: &str, args: TaskArgs) -> Result<TaskToken> {
        let (token, url) = self.link(args).await?;
        let text = format!("Please, follow the link to \"{prompt}\": {url}");
        self.writer.send_now(&text, address).await?;
        tracing::info!("Asked {address} via {} to confirm '{prompt}'", self.channel());
        Ok(token)
    }

    /// Deliver `text`, respecting the recipient's active hours.
    pub async fn notify(
        &self,
        address: &str,
        text: &str,
        window: Option<&ActiveWindow>,
    ) -> Result<Delivery> {
        self.notify_at(address, text, window, NotificationScheduler::current_hour())
            .await
    }

    /// [`notify`](Self::notify) with an explicit UTC hour.
    pub async fn notify_at(
        &self,
        address: &str,
        text: &str,
        window: Option<&ActiveWindow>,
        hour: u8,
    ) -> Result<Delivery> {
        NotificationScheduler::deliver(self.writer.as_ref(), text, address, window, hour).await
    }
}

//! Email writer: SMTP sending via async lettre (STARTTLS relay).

use std::time::Duration;

use async_trait::async_trait;
use bazaar_core::config::EmailConfig;
use bazaar_core::{BazaarError, MessageWriter, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

#[derive(Clone)]
pub struct EmailWriter {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    subject: String,
}

impl EmailWriter {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let creds = Credentials::new(config.email.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| BazaarError::Channel(format!("SMTP relay: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();
        Ok(Self {
            mailer,
            from: from_mailbox(config)?,
            subject: config.subject.clone(),
        })
    }

    /// Build the outgoing message. Fails on an unparsable recipient.
    pub fn build_message(&self, to: &str, body: &str) -> Result<Message> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| BazaarError::Channel(format!("Invalid to '{to}': {e}")))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(self.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| BazaarError::Channel(format!("Build email: {e}")))
    }

    async fn send(&self, email: Message, to: &str) -> Result<()> {
        self.mailer
            .send(email)
            .await
            .map_err(|e| BazaarError::Channel(format!("SMTP send: {e}")))?;
        tracing::info!("Email sent to: {to}");
        Ok(())
    }
}

fn from_mailbox(config: &EmailConfig) -> Result<Mailbox> {
    let raw = match &config.display_name {
        Some(name) => format!("{name} <{}>", config.email),
        None => config.email.clone(),
    };
    raw.parse()
        .map_err(|e| BazaarError::Config(format!("Invalid sender '{raw}': {e}")))
}

#[async_trait]
impl MessageWriter for EmailWriter {
    fn name(&self) -> &str {
        "email"
    }

    async fn send_now(&self, text: &str, address: &str) -> Result<()> {
        let email = self.build_message(address, text)?;
        self.send(email, address).await
    }

    async fn send_later(&self, text: &str, address: &str, eta: Duration) -> Result<()> {
        let email = self.build_message(address, text)?;
        let writer = self.clone();
        let to = address.to_string();
        crate::deliver_after("email", to.clone(), eta, async move {
            writer.send(email, &to).await
        });
        Ok(())
    }
}

use anyhow::{Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::Notifier;
use crate::config::AlertConfig;

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    subject: String,
}

impl EmailNotifier {
    pub fn from_config(cfg: &AlertConfig) -> Result<Self> {
        let creds = Credentials::new(cfg.username.clone(), cfg.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
            .with_context(|| format!("invalid smtp host {}", cfg.smtp_host))?
            .port(cfg.smtp_port)
            .credentials(creds)
            .build();

        let from: Mailbox = cfg.from.parse().context("invalid alert.from address")?;
        let to: Mailbox = cfg.to.parse().context("invalid alert.to address")?;

        Ok(Self {
            mailer,
            from,
            to,
            subject: cfg.subject.clone(),
        })
    }

    fn build(&self, message: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(message.to_string())
            .context("build email")
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn report_failure(&self, message: &str) -> Result<()> {
        let msg = self.build(message)?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }
}

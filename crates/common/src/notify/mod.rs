//! Email notifications for unanswerable questions
//!
//! When retrieval cannot clear the relevance threshold, the answer engine
//! reports the question here so maintainers learn which topics the corpus
//! is missing.

use crate::config::NotifyConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Sink for unanswerable-question alerts
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Report a question the corpus could not answer.
    async fn notify_insufficient(&self, question: &str, best_score: Option<f32>) -> Result<()>;
}

/// Notifier that emails a maintainer via an SMTP relay.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Build a notifier from configuration.
    ///
    /// Returns `None` when notifications are disabled or the SMTP settings
    /// are incomplete. Incomplete settings log a warning instead of failing
    /// startup; the rest of the service works without the notifier.
    pub fn from_config(config: &NotifyConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let (host, from_addr, to_addr) = match (&config.smtp_host, &config.from, &config.to) {
            (Some(h), Some(f), Some(t)) => (h, f, t),
            _ => {
                tracing::warn!(
                    "Email notifications enabled but notify.smtp_host/from/to are incomplete, disabling"
                );
                return None;
            }
        };

        let from: Mailbox = match from_addr.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid notify.from address, disabling email notifications");
                return None;
            }
        };

        let to: Mailbox = match to_addr.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid notify.to address, disabling email notifications");
                return None;
            }
        };

        let mut builder = match AsyncSmtpTransport::<Tokio1Executor>::relay(host) {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to configure SMTP relay, disabling email notifications");
                return None;
            }
        };
        builder = builder.port(config.smtp_port);

        if let (Some(username), Some(password)) =
            (config.username.clone(), config.password.clone())
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Some(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify_insufficient(&self, question: &str, best_score: Option<f32>) -> Result<()> {
        let score = match best_score {
            Some(s) => format!("{:.4}", s),
            None => "none".to_string(),
        };
        let body = format!(
            "Question: {}\nBest relevance score: {}\nTime: {} UTC\n",
            question,
            score,
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject("Veridex: unanswerable question")
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::NotificationError {
                message: format!("Failed to build message: {}", e),
            })?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::NotificationError {
                message: format!("SMTP send failed: {}", e),
            })?;

        Ok(())
    }
}

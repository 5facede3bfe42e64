//! Email Channel — SMTP delivery of the guest pass.
//!
//! The message is `multipart/related`: the rendered HTML body followed by
//! each QR image inline, so the template can reference it as
//! `<img src="cid:{{ unique_id }}">`.

use async_trait::async_trait;
use guestpass_core::config::{SmtpConfig, SmtpSecurity};
use guestpass_core::error::{GuestPassError, Result};
use guestpass_core::traits::Notifier;
use guestpass_core::types::{Delivery, Language};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::template::TemplateStore;

/// Localized subject line.
pub fn subject(language: Language) -> &'static str {
    match language {
        Language::Ru => "Ваш QR-код",
        Language::Other => "Your QR code",
    }
}

/// Email notifier over an authenticated SMTP relay.
pub struct EmailNotifier {
    from: Mailbox,
    templates: TemplateStore,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailNotifier {
    /// Builds the transport without connecting; the first send opens the connection.
    pub fn new(smtp: &SmtpConfig, templates: TemplateStore) -> Result<Self> {
        let from: Mailbox = smtp
            .from
            .parse()
            .map_err(|e| GuestPassError::Config(format!("Invalid MAIL_FROM '{}': {e}", smtp.from)))?;

        let builder = match smtp.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
                .map_err(|e| GuestPassError::Config(format!("SMTP relay: {e}")))?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                    .map_err(|e| GuestPassError::Config(format!("SMTP relay: {e}")))?
            }
            SmtpSecurity::None => {
                tracing::warn!("⚠️ SMTP without TLS to {}", smtp.host);
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
            }
        };

        let mailer = builder
            .port(smtp.port)
            .credentials(Credentials::new(smtp.username.clone(), smtp.password.clone()))
            .timeout(Some(smtp.timeout))
            .build();
        tracing::debug!(
            "📧 SMTP {}:{} ({:?}), templates in {}",
            smtp.host,
            smtp.port,
            smtp.security,
            templates.dir().display()
        );

        Ok(Self {
            from,
            templates,
            mailer,
        })
    }

    /// Render the template, read attachments, and assemble the message.
    pub async fn compose(&self, delivery: &Delivery) -> Result<Message> {
        let to: Mailbox = delivery.recipient.parse().map_err(|e| {
            GuestPassError::Delivery(format!("Invalid recipient '{}': {e}", delivery.recipient))
        })?;

        let html = self
            .templates
            .render(delivery.language, &delivery.unique_id, &delivery.guest_name)
            .await?;

        let png = ContentType::parse("image/png")
            .map_err(|e| GuestPassError::Delivery(format!("Content type: {e}")))?;
        let mut body = MultiPart::related().singlepart(SinglePart::html(html));
        for attachment in &delivery.attachments {
            let bytes = tokio::fs::read(&attachment.path).await.map_err(|e| {
                GuestPassError::Delivery(format!(
                    "Attachment {} unreadable: {e}",
                    attachment.path.display()
                ))
            })?;
            body = body.singlepart(
                Attachment::new_inline(attachment.content_id.clone()).body(bytes, png.clone()),
            );
        }

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject(delivery.language))
            .multipart(body)
            .map_err(|e| GuestPassError::Delivery(format!("Build email: {e}")))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn send(&self, delivery: &Delivery) -> Result<()> {
        let message = self.compose(delivery).await?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| GuestPassError::Delivery(format!("SMTP send: {e}")))?;
        tracing::info!("📤 Email sent to: {}", delivery.recipient);
        Ok(())
    }
}

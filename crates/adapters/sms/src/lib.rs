//! # sunfade-adapter-sms
//!
//! [`Notifier`] that sends alerts as text messages by emailing the carrier's
//! SMS gateway (`<digits>@<gateway>`) through an SMTP relay.
//!
//! Credentials are never baked in: the password comes from [`SmsConfig`],
//! which the daemon fills from its configuration file or environment.

pub mod config;
pub mod error;
pub mod gateway;

use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use sunfade_app::ports::Notifier;
use sunfade_domain::error::{SunfadeError, ValidationError};

pub use config::{SmsConfig, SmtpSecurity};
pub use error::SmsError;

/// Sends alerts through an email-to-SMS gateway.
pub struct SmsNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    subject: String,
}

impl SmsNotifier {
    /// Build a notifier from `config`. No connection is opened yet.
    ///
    /// # Errors
    ///
    /// Fails for unknown carriers, missing settings, malformed addresses or an
    /// unusable relay hostname.
    pub fn new(config: &SmsConfig) -> Result<Self, SmsError> {
        let (from, to) = mailboxes(config)?;
        if config.smtp_host.trim().is_empty() {
            return Err(ValidationError::MissingNotificationSetting("smtp_host").into());
        }

        let builder = match config.security {
            SmtpSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?,
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
            }
        };
        let mut builder = builder.port(config.smtp_port);
        if let Some(password) = config.password.as_ref() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                password.clone(),
            ));
        }

        tracing::debug!(
            relay = %config.smtp_host,
            port = config.smtp_port,
            to = %to,
            "SMS notifier configured"
        );
        Ok(Self {
            mailer: builder.build(),
            from,
            to,
            subject: config.subject.clone(),
        })
    }

    fn compose(&self, body: &str) -> Result<Message, SmsError> {
        compose(&self.from, &self.to, &self.subject, body)
    }
}

impl Notifier for SmsNotifier {
    async fn notify(&self, message: &str) -> Result<(), SunfadeError> {
        let email = self.compose(message)?;
        self.mailer.send(email).await.map_err(SmsError::from)?;
        tracing::debug!(to = %self.to, "SMS handed to relay");
        Ok(())
    }
}

fn mailboxes(config: &SmsConfig) -> Result<(Mailbox, Mailbox), SmsError> {
    let recipient = gateway::sms_address(&config.phone, &config.carrier)?;
    if config.sender().trim().is_empty() {
        return Err(ValidationError::MissingNotificationSetting("from").into());
    }
    Ok((config.sender().parse()?, recipient.parse()?))
}

fn compose(from: &Mailbox, to: &Mailbox, subject: &str, body: &str) -> Result<Message, SmsError> {
    Ok(Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())?)
}

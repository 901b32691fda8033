//! SMS notifier configuration.

use serde::Deserialize;

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS.
    #[default]
    Starttls,
    /// TLS from the first byte.
    Tls,
    /// No encryption. Only for relays on the local network.
    None,
}

/// Configuration for the email-to-SMS notifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    /// Destination phone number. Non-digits are ignored.
    pub phone: String,
    /// Destination carrier, e.g. `"verizon"`.
    pub carrier: String,
    /// SMTP relay hostname.
    pub smtp_host: String,
    /// SMTP relay port.
    pub smtp_port: u16,
    pub security: SmtpSecurity,
    /// SMTP login. Also used as the sender when `from` is unset.
    pub username: String,
    /// SMTP password. Usually supplied through the environment.
    pub password: Option<String>,
    /// Sender address.
    pub from: Option<String>,
    pub subject: String,
}

impl SmsConfig {
    /// Sender address: `from`, or the SMTP login.
    #[must_use]
    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.username)
    }
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            phone: String::new(),
            carrier: String::new(),
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            security: SmtpSecurity::Starttls,
            username: String::new(),
            password: None,
            from: None,
            subject: "sunfade".to_string(),
        }
    }
}

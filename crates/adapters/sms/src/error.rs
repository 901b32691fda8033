//! SMS adapter error types.

use sunfade_domain::error::{SunfadeError, ValidationError};

/// Errors specific to the SMS adapter.
#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// The configuration cannot produce a deliverable message.
    #[error("invalid SMS configuration")]
    Invalid(#[from] ValidationError),

    /// Sender or recipient is not a valid email address.
    #[error("invalid email address")]
    Address(#[from] lettre::address::AddressError),

    /// The message could not be assembled.
    #[error("failed to build message")]
    Message(#[from] lettre::error::Error),

    /// The SMTP relay refused the connection or the message.
    #[error("SMTP delivery failed")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

impl From<SmsError> for SunfadeError {
    fn from(err: SmsError) -> Self {
        match err {
            SmsError::Invalid(err) => Self::Configuration(err),
            other => Self::Notification(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_to_configuration_error() {
        let err: SunfadeError =
            SmsError::Invalid(ValidationError::UnmappedCarrier("pigeon".to_string())).into();
        assert!(matches!(err, SunfadeError::Configuration(_)));
    }

    #[test]
    fn should_convert_address_error_to_notification_error() {
        let address_err = "not an address"
            .parse::<lettre::Address>()
            .unwrap_err();
        let err: SunfadeError = SmsError::Address(address_err).into();
        assert!(matches!(err, SunfadeError::Notification(_)));
    }
}

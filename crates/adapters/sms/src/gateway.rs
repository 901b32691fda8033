//! Carrier email-to-SMS gateways.

use sunfade_domain::error::ValidationError;

const GATEWAYS: &[(&str, &str)] = &[
    ("att", "txt.att.net"),
    ("boost", "sms.myboostmobile.com"),
    ("cricket", "sms.cricketwireless.net"),
    ("googlefi", "msg.fi.google.com"),
    ("sprint", "messaging.sprintpcs.com"),
    ("tmobile", "tmomail.net"),
    ("uscellular", "email.uscc.net"),
    ("verizon", "vtext.com"),
    ("virgin", "vmobl.com"),
];

/// Gateway domain for `carrier`, matched case-insensitively and ignoring
/// spaces, dashes and ampersands (`"T-Mobile"`, `"AT&T"`).
#[must_use]
pub fn gateway_domain(carrier: &str) -> Option<&'static str> {
    let key: String = carrier
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '&' | '_'))
        .flat_map(char::to_lowercase)
        .collect();
    GATEWAYS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, domain)| *domain)
}

/// Email address delivering to `phone` as a text message.
///
/// # Errors
///
/// Returns [`ValidationError::MissingNotificationSetting`] when `phone`
/// holds no digits and [`ValidationError::UnmappedCarrier`] for unknown
/// carriers.
pub fn sms_address(phone: &str, carrier: &str) -> Result<String, ValidationError> {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ValidationError::MissingNotificationSetting("phone"));
    }
    let domain =
        gateway_domain(carrier).ok_or_else(|| ValidationError::UnmappedCarrier(carrier.to_string()))?;
    Ok(format!("{digits}@{domain}"))
}

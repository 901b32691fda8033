//! Configuration loading: TOML file with environment variable overrides.
//!
//! Reads `sunfade.toml` from the working directory, or the file named by
//! `SUNFADE_CONFIG`. Every section has defaults, but a usable configuration
//! needs at least a location and one dimmer. Environment variables take
//! precedence over file values.

use std::collections::HashSet;
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;
use sunfade_adapter_kasa::{KasaConfig, PowerStrip};
use sunfade_adapter_sms::SmsConfig;
use sunfade_adapter_solar::SolarCalculator;
use sunfade_app::sync_loop::SyncSettings;
use sunfade_domain::dimmer::DimmerAddress;
use sunfade_domain::error::ValidationError;
use sunfade_domain::geo::Coordinates;
use sunfade_domain::schedule::FadeWindow;

/// Config file looked up when `SUNFADE_CONFIG` is unset.
pub const DEFAULT_PATH: &str = "sunfade.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schedule: ScheduleConfig,
    pub location: LocationConfig,
    pub devices: DevicesConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

/// Timing of the sync loop and the fade ramps.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Delay between two sync cycles, in seconds.
    pub poll_interval_secs: u64,
    /// Length of the sunrise and sunset ramps, in minutes.
    pub fade_minutes: u32,
    /// Limit for a single device operation, in seconds.
    pub device_timeout_secs: u64,
    /// Send commands even when a dimmer already shows the target.
    pub reapply_unchanged: bool,
}

/// Where the lights are.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// IANA timezone name. Derived from the longitude when unset.
    pub timezone: Option<String>,
}

/// Which device family drives the dimmers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// TP-Link Kasa dimmers on the local network.
    #[default]
    Kasa,
    /// Simulated in-process dimmers.
    Virtual,
}

/// One configured dimmer.
#[derive(Debug, Clone, Deserialize)]
pub struct DimmerConfig {
    /// `host` or `host:port`.
    pub address: String,
    /// 1-based power strip outlet feeding this dimmer.
    #[serde(default)]
    pub outlet: Option<u8>,
}

/// The dimmers and how to reach them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DevicesConfig {
    pub backend: BackendKind,
    /// Address of the power strip feeding the dimmers, if any.
    pub strip: Option<String>,
    pub dimmers: Vec<DimmerConfig>,
    pub kasa: KasaConfig,
}

/// Alert delivery.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
    /// Minimum delay between two alerts, in minutes.
    pub cooldown_minutes: u32,
    /// Destination and SMTP relay.
    #[serde(flatten)]
    pub sms: SmsConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from the config file (if present), apply
    /// environment-variable overrides, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed, if an explicitly named
    /// file cannot be read, or if validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("SUNFADE_CONFIG") {
            Ok(path) => Self::read(&path)?,
            Err(_) => Self::from_file(DEFAULT_PATH)?,
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match Self::read(path) {
            Err(ConfigError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    fn read(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("SUNFADE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(secs) = var("SUNFADE_POLL_INTERVAL_SECS").and_then(|val| val.parse().ok()) {
            self.schedule.poll_interval_secs = secs;
        }
        if let Some(val) = var("SUNFADE_SMTP_PASSWORD") {
            self.notifications.sms.password = Some(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let settings = self.sync_settings()?;
        // a Kasa exchange has to time out before the loop gives up on the device
        if self.devices.backend == BackendKind::Kasa
            && self.devices.kasa.io_timeout() >= settings.device_timeout
        {
            return Err(ConfigError::Validation(format!(
                "devices.kasa.io_timeout_ms ({}) must be below schedule.device_timeout_secs ({})",
                self.devices.kasa.io_timeout_ms, self.schedule.device_timeout_secs
            )));
        }
        SolarCalculator::new(self.coordinates()?, self.location.timezone.as_deref())?;
        self.addresses()?;
        self.power_strip()?;

        if self.notifications.enabled {
            sunfade_adapter_sms::gateway::sms_address(
                &self.notifications.sms.phone,
                &self.notifications.sms.carrier,
            )?;
            if self.notifications.sms.smtp_host.trim().is_empty() {
                return Err(ValidationError::MissingNotificationSetting("smtp_host").into());
            }
        }
        Ok(())
    }

    /// Installation coordinates.
    ///
    /// # Errors
    ///
    /// Fails when latitude or longitude is missing or out of range.
    pub fn coordinates(&self) -> Result<Coordinates, ConfigError> {
        let (Some(latitude), Some(longitude)) = (self.location.latitude, self.location.longitude)
        else {
            return Err(ConfigError::Validation(
                "location.latitude and location.longitude are required".to_string(),
            ));
        };
        Ok(Coordinates::new(latitude, longitude)?)
    }

    /// Settings for the sync loop.
    ///
    /// # Errors
    ///
    /// Fails for a zero poll interval, zero device timeout or empty fade.
    pub fn sync_settings(&self) -> Result<SyncSettings, ConfigError> {
        let schedule = &self.schedule;
        if schedule.poll_interval_secs == 0 {
            return Err(ValidationError::ZeroPollInterval.into());
        }
        if schedule.device_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "schedule.device_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(SyncSettings {
            poll_interval: Duration::from_secs(schedule.poll_interval_secs),
            fade: FadeWindow::from_minutes(schedule.fade_minutes)?,
            device_timeout: Duration::from_secs(schedule.device_timeout_secs),
            reapply_unchanged: schedule.reapply_unchanged,
        })
    }

    /// Dimmer addresses in configuration order.
    ///
    /// # Errors
    ///
    /// Fails for an empty list, a blank address or a duplicate.
    pub fn addresses(&self) -> Result<Vec<DimmerAddress>, ValidationError> {
        if self.devices.dimmers.is_empty() {
            return Err(ValidationError::NoDimmers);
        }
        let mut seen = HashSet::new();
        self.devices
            .dimmers
            .iter()
            .map(|dimmer| {
                let address = DimmerAddress::new(&dimmer.address)?;
                if !seen.insert(address.clone()) {
                    return Err(ValidationError::DuplicateAddress(address.to_string()));
                }
                Ok(address)
            })
            .collect()
    }

    /// The power strip with its outlet assignments, if one is configured.
    ///
    /// # Errors
    ///
    /// Fails when an outlet is given without a strip, or an outlet is 0.
    pub fn power_strip(&self) -> Result<Option<PowerStrip>, ConfigError> {
        let Some(strip) = self.devices.strip.as_deref() else {
            if self.devices.dimmers.iter().any(|d| d.outlet.is_some()) {
                return Err(ConfigError::Validation(
                    "dimmer outlets require devices.strip".to_string(),
                ));
            }
            return Ok(None);
        };

        let mut power_strip = PowerStrip::new(DimmerAddress::new(strip)?);
        for dimmer in &self.devices.dimmers {
            let Some(outlet) = dimmer.outlet else {
                continue;
            };
            if outlet == 0 {
                return Err(ConfigError::Validation(format!(
                    "outlet of {} must be 1 or more",
                    dimmer.address.trim()
                )));
            }
            power_strip = power_strip.with_outlet(DimmerAddress::new(&dimmer.address)?, outlet);
        }
        Ok(Some(power_strip))
    }

    /// Minimum delay between two alerts.
    #[must_use]
    pub fn cooldown(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.notifications.cooldown_minutes))
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1,
            fade_minutes: 120,
            device_timeout_secs: 5,
            reapply_unchanged: false,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cooldown_minutes: 120,
            sms: SmsConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "sunfade=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// A value failed domain validation.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use sunfade_adapter_sms::SmtpSecurity;

    const FULL: &str = r#"
        [schedule]
        poll_interval_secs = 30
        fade_minutes = 90
        device_timeout_secs = 3
        reapply_unchanged = true

        [location]
        latitude = 35.227085
        longitude = -80.843124
        timezone = "America/New_York"

        [devices]
        backend = "kasa"
        strip = "192.168.1.160"

        [devices.kasa]
        io_timeout_ms = 2000

        [[devices.dimmers]]
        address = "192.168.1.161"
        outlet = 1

        [[devices.dimmers]]
        address = "192.168.1.188"
        outlet = 2

        [[devices.dimmers]]
        address = "192.168.1.187"

        [notifications]
        enabled = true
        cooldown_minutes = 60
        phone = "704-555-0123"
        carrier = "verizon"
        smtp_host = "smtp.example.com"
        smtp_port = 465
        security = "tls"
        username = "lights@example.com"

        [logging]
        filter = "debug"
    "#;

    fn minimal() -> Config {
        toml::from_str(
            r#"
            [location]
            latitude = 35.227085
            longitude = -80.843124

            [[devices.dimmers]]
            address = "192.168.1.161"
            "#,
        )
        .unwrap()
    }

    fn validation_message(err: ConfigError) -> String {
        match err {
            ConfigError::Validation(message) => message,
            other => panic!("expected validation message, got {other:?}"),
        }
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.schedule.poll_interval_secs, 1);
        assert_eq!(config.schedule.fade_minutes, 120);
        assert_eq!(config.schedule.device_timeout_secs, 5);
        assert!(!config.schedule.reapply_unchanged);
        assert_eq!(config.devices.backend, BackendKind::Kasa);
        assert!(!config.notifications.enabled);
        assert_eq!(config.cooldown(), TimeDelta::hours(2));
        assert_eq!(config.logging.filter, "sunfade=info");
    }

    #[test]
    fn should_parse_full_toml() {
        let config: Config = toml::from_str(FULL).unwrap();
        assert_eq!(config.schedule.poll_interval_secs, 30);
        assert!(config.schedule.reapply_unchanged);
        assert_eq!(
            config.location.timezone.as_deref(),
            Some("America/New_York")
        );
        assert_eq!(config.devices.strip.as_deref(), Some("192.168.1.160"));
        assert_eq!(config.devices.dimmers.len(), 3);
        assert_eq!(config.devices.dimmers[1].outlet, Some(2));
        assert_eq!(config.devices.dimmers[2].outlet, None);
        assert_eq!(config.devices.kasa.io_timeout_ms, 2000);
        assert_eq!(config.devices.kasa.port, 9999);
        assert!(config.notifications.enabled);
        assert_eq!(config.notifications.sms.carrier, "verizon");
        assert_eq!(config.notifications.sms.smtp_port, 465);
        assert_eq!(config.notifications.sms.security, SmtpSecurity::Tls);
        assert_eq!(config.cooldown(), TimeDelta::hours(1));
        assert_eq!(config.logging.filter, "debug");
        config.validate().unwrap();
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config = minimal();
        assert_eq!(config.schedule.fade_minutes, 120);
        assert_eq!(config.devices.backend, BackendKind::Kasa);
        assert!(config.devices.strip.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn should_parse_virtual_backend() {
        let config: Config = toml::from_str("[devices]\nbackend = \"virtual\"").unwrap();
        assert_eq!(config.devices.backend, BackendKind::Virtual);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert!(config.devices.dimmers.is_empty());
    }

    #[test]
    fn should_fail_when_named_file_is_missing() {
        assert!(matches!(
            Config::read("nonexistent.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn should_build_sync_settings() {
        let config: Config = toml::from_str(FULL).unwrap();
        let settings = config.sync_settings().unwrap();
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
        assert_eq!(settings.fade.duration(), TimeDelta::minutes(90));
        assert_eq!(settings.device_timeout, Duration::from_secs(3));
        assert!(settings.reapply_unchanged);
    }

    #[test]
    fn should_list_addresses_in_order() {
        let config: Config = toml::from_str(FULL).unwrap();
        let addresses: Vec<String> = config
            .addresses()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            addresses,
            ["192.168.1.161", "192.168.1.188", "192.168.1.187"]
        );
    }

    #[test]
    fn should_apply_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SUNFADE_LOG", "sunfade=debug"),
            ("SUNFADE_POLL_INTERVAL_SECS", "15"),
            ("SUNFADE_SMTP_PASSWORD", "from-env"),
        ]);
        let mut config = minimal();
        config.apply_overrides(|key| env.get(key).map(ToString::to_string));
        assert_eq!(config.logging.filter, "sunfade=debug");
        assert_eq!(config.schedule.poll_interval_secs, 15);
        assert_eq!(
            config.notifications.sms.password.as_deref(),
            Some("from-env")
        );
    }

    #[test]
    fn should_let_rust_log_win_over_sunfade_log() {
        let env: HashMap<&str, &str> =
            HashMap::from([("SUNFADE_LOG", "info"), ("RUST_LOG", "trace")]);
        let mut config = minimal();
        config.apply_overrides(|key| env.get(key).map(ToString::to_string));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparsable_poll_interval_override() {
        let mut config = minimal();
        config.apply_overrides(|key| {
            (key == "SUNFADE_POLL_INTERVAL_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config.schedule.poll_interval_secs, 1);
    }

    #[test]
    fn should_require_location() {
        let config: Config =
            toml::from_str("[[devices.dimmers]]\naddress = \"192.168.1.161\"").unwrap();
        let message = validation_message(config.validate().unwrap_err());
        assert!(message.contains("location.latitude"));
    }

    #[test]
    fn should_reject_out_of_range_latitude() {
        let mut config = minimal();
        config.location.latitude = Some(123.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::InvalidLatitude(_)))
        ));
    }

    #[test]
    fn should_reject_unknown_timezone() {
        let mut config = minimal();
        config.location.timezone = Some("Mars/Olympus_Mons".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::UnknownTimezone(_)))
        ));
    }

    #[test]
    fn should_reject_missing_dimmers() {
        let mut config = minimal();
        config.devices.dimmers.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::NoDimmers))
        ));
    }

    #[test]
    fn should_reject_blank_dimmer_address() {
        let mut config = minimal();
        config.devices.dimmers[0].address = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::EmptyAddress))
        ));
    }

    #[test]
    fn should_reject_duplicate_dimmer_address() {
        let mut config = minimal();
        config.devices.dimmers.push(DimmerConfig {
            address: " 192.168.1.161 ".to_string(),
            outlet: None,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::DuplicateAddress(_)))
        ));
    }

    #[test]
    fn should_reject_zero_poll_interval() {
        let mut config = minimal();
        config.schedule.poll_interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::ZeroPollInterval))
        ));
    }

    #[test]
    fn should_reject_zero_fade_window() {
        let mut config = minimal();
        config.schedule.fade_minutes = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::NonPositiveFadeWindow))
        ));
    }

    #[test]
    fn should_reject_zero_device_timeout() {
        let mut config = minimal();
        config.schedule.device_timeout_secs = 0;
        let message = validation_message(config.validate().unwrap_err());
        assert!(message.contains("device_timeout_secs"));
    }

    #[test]
    fn should_reject_kasa_io_timeout_not_below_device_timeout() {
        let mut config = minimal();
        config.schedule.device_timeout_secs = 5;
        config.devices.kasa.io_timeout_ms = 5_000;
        let message = validation_message(config.validate().unwrap_err());
        assert!(message.contains("io_timeout_ms"));

        config.devices.kasa.io_timeout_ms = 4_999;
        config.validate().unwrap();
    }

    #[test]
    fn should_not_bound_io_timeout_for_virtual_backend() {
        let mut config = minimal();
        config.devices.backend = BackendKind::Virtual;
        config.devices.kasa.io_timeout_ms = 60_000;
        config.validate().unwrap();
    }

    #[test]
    fn should_reject_outlet_without_strip() {
        let mut config = minimal();
        config.devices.dimmers[0].outlet = Some(1);
        let message = validation_message(config.validate().unwrap_err());
        assert!(message.contains("devices.strip"));
    }

    #[test]
    fn should_reject_outlet_zero() {
        let mut config = minimal();
        config.devices.strip = Some("192.168.1.160".to_string());
        config.devices.dimmers[0].outlet = Some(0);
        let message = validation_message(config.validate().unwrap_err());
        assert!(message.contains("192.168.1.161"));
    }

    #[test]
    fn should_reject_unmapped_carrier_when_notifications_enabled() {
        let mut config = minimal();
        config.notifications.enabled = true;
        config.notifications.sms.phone = "7045550123".to_string();
        config.notifications.sms.carrier = "pigeon".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(ValidationError::UnmappedCarrier(_)))
        ));
    }

    #[test]
    fn should_ignore_notification_settings_when_disabled() {
        let mut config = minimal();
        config.notifications.sms.carrier = "pigeon".to_string();
        config.validate().unwrap();
    }
}

//! Listener configuration.
//!
//! Every field has a default, so an empty file is a valid configuration that
//! subscribes to the built-in usage list and enables the known quirk devices.
//!
//! ```toml
//! observe_all = false
//! poll = ["VID_046D&PID_C24F"]
//! ignore = ["VID_044F&PID_B10A"]
//!
//! [[registrations]]
//! usage_page = 1
//! usage_id = 5
//!
//! [quirks]
//! devices = ["Simucube 2 Pro"]
//! sentinel_usage = 1
//! ```

use crate::catalog::UsageRegistration;
use crate::error::ConfigError;
use crate::quirks::{QuirkFilter, DEFAULT_SENTINEL_USAGE, SIMUCUBE_2_PRO};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Usage pairs subscribed to when nothing else is configured: generic
/// game controllers plus the collections wheel bases expose their buttons on.
pub const DEFAULT_REGISTRATIONS: &[UsageRegistration] = &[
    UsageRegistration::new(0x01, 0x05), // gamepad
    UsageRegistration::new(0x01, 0x04), // joystick
    UsageRegistration::new(0x01, 0x01), // pointer
    // Fanatec ClubSport / Podium bases
    UsageRegistration::new(0x01, 0x3C),
    UsageRegistration::new(0x01, 0x3A),
    // Simucube 2 Pro reports on the joystick collection above.
    // generic HID with force feedback
    UsageRegistration::new(0xFF00, 0x01),
    // Logitech G923 / G920 / PRO wheels
    UsageRegistration::new(0xFF43, 0x0604),
    UsageRegistration::new(0xFF43, 0x0602),
    UsageRegistration::new(0xFF43, 0x0702),
    UsageRegistration::new(0xFF43, 0x0704),
    UsageRegistration::new(0xFFFD, 0xFD01),
    // Logitech G29
    UsageRegistration::new(0xFF00, 0x02),
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuirkConfig {
    /// OEM display names the vendor quirk filter applies to.
    pub devices: Vec<String>,
    pub sentinel_usage: u16,
}

impl Default for QuirkConfig {
    fn default() -> Self {
        Self {
            devices: vec![SIMUCUBE_2_PRO.to_string()],
            sentinel_usage: DEFAULT_SENTINEL_USAGE,
        }
    }
}

impl QuirkConfig {
    pub fn build(&self) -> QuirkFilter {
        QuirkFilter::new(self.devices.iter().cloned(), self.sentinel_usage)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Deliver reports from every non-ignored device, not just polled ones.
    pub observe_all: bool,
    pub registrations: Vec<UsageRegistration>,
    /// Interface path fragments to poll.
    pub poll: Vec<String>,
    /// Interface path fragments never to poll.
    pub ignore: Vec<String>,
    pub quirks: QuirkConfig,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            observe_all: false,
            registrations: DEFAULT_REGISTRATIONS.to_vec(),
            poll: Vec::new(),
            ignore: Vec::new(),
            quirks: QuirkConfig::default(),
        }
    }
}

impl ListenerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let text = std::fs::read_to_string(path)?;
        let config = match ext.as_str() {
            "toml" => Self::from_toml_str(&text)?,
            "json" => Self::from_json_str(&text)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };
        tracing::debug!(path = %path.display(), registrations = config.registrations.len(), "config loaded");
        Ok(config)
    }
}

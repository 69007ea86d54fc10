// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Static configuration of the controller.
///
/// All fields have defaults matching a stock Venus OS install, so a JSON
/// file only needs the values that differ.
///
/// # Examples
///
/// ```
/// use acwh_switch::ControllerConfig;
/// use std::time::Duration;
///
/// let config = ControllerConfig::default()
///     .with_target_names(["Boiler"])
///     .with_max_relay_slots(4)
///     .with_monitoring_interval(Duration::from_secs(10));
///
/// assert!(config.is_target_name("Boiler"));
/// assert!(!config.is_target_name("AC WH"));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Custom names that identify the water-heater relay.
    pub target_names: Vec<String>,
    /// Number of relay slots scanned during discovery.
    pub max_relay_slots: u8,
    /// Service holding relay custom names.
    pub settings_service: String,
    /// Service holding relay states and the active input source.
    pub system_service: String,
    /// Seconds between discovery scans.
    pub discovery_interval_secs: u64,
    /// Seconds between source reads until the initial decision is made.
    pub initialization_interval_secs: u64,
    /// Seconds between source reads while monitoring.
    pub monitoring_interval_secs: u64,
    /// Append logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            target_names: vec!["AC Water Heater".to_string(), "AC WH".to_string()],
            max_relay_slots: Self::DEFAULT_MAX_RELAY_SLOTS,
            settings_service: "com.victronenergy.settings".to_string(),
            system_service: "com.victronenergy.system".to_string(),
            discovery_interval_secs: 2,
            initialization_interval_secs: 1,
            monitoring_interval_secs: 5,
            log_file: None,
        }
    }
}

impl ControllerConfig {
    /// Default number of relay slots to scan.
    pub const DEFAULT_MAX_RELAY_SLOTS: u8 = 10;

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed or fails
    /// [`validate`](Self::validate).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&contents)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON is malformed or invalid.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_names.iter().all(|n| n.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "target_names must contain at least one non-empty name".to_string(),
            ));
        }
        if self.max_relay_slots == 0 {
            return Err(ConfigError::Invalid(
                "max_relay_slots must be at least 1".to_string(),
            ));
        }
        if self.settings_service.is_empty() || self.system_service.is_empty() {
            return Err(ConfigError::Invalid(
                "service names must not be empty".to_string(),
            ));
        }
        for (field, secs) in [
            ("discovery_interval_secs", self.discovery_interval_secs),
            ("initialization_interval_secs", self.initialization_interval_secs),
            ("monitoring_interval_secs", self.monitoring_interval_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{field} must be at least 1")));
            }
        }
        Ok(())
    }

    /// Replaces the target custom names.
    #[must_use]
    pub fn with_target_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the number of relay slots to scan.
    #[must_use]
    pub fn with_max_relay_slots(mut self, slots: u8) -> Self {
        self.max_relay_slots = slots;
        self
    }

    /// Sets the settings and system service names.
    #[must_use]
    pub fn with_services(
        mut self,
        settings: impl Into<String>,
        system: impl Into<String>,
    ) -> Self {
        self.settings_service = settings.into();
        self.system_service = system.into();
        self
    }

    /// Sets the interval between discovery scans.
    ///
    /// Intervals are kept in whole seconds; a fractional interval is
    /// rounded up, so only `Duration::ZERO` fails [`validate`](Self::validate).
    #[must_use]
    pub fn with_discovery_interval(mut self, interval: Duration) -> Self {
        self.discovery_interval_secs = whole_secs(interval);
        self
    }

    /// Sets the retry interval for the initial source read.
    #[must_use]
    pub fn with_initialization_interval(mut self, interval: Duration) -> Self {
        self.initialization_interval_secs = whole_secs(interval);
        self
    }

    /// Sets the interval between source reads while monitoring.
    #[must_use]
    pub fn with_monitoring_interval(mut self, interval: Duration) -> Self {
        self.monitoring_interval_secs = whole_secs(interval);
        self
    }

    /// Sets the log file path.
    #[must_use]
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Returns `true` if `name` is one of the target custom names.
    #[must_use]
    pub fn is_target_name(&self, name: &str) -> bool {
        self.target_names.iter().any(|t| t == name)
    }

    /// Interval between discovery scans.
    #[must_use]
    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs)
    }

    /// Retry interval for the initial source read.
    #[must_use]
    pub fn initialization_interval(&self) -> Duration {
        Duration::from_secs(self.initialization_interval_secs)
    }

    /// Interval between source reads while monitoring.
    #[must_use]
    pub fn monitoring_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring_interval_secs)
    }
}

fn whole_secs(interval: Duration) -> u64 {
    interval
        .as_secs()
        .saturating_add(u64::from(interval.subsec_nanos() > 0))
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the water-heater switch.
//!
//! Failures are grouped by where they originate: the property bus
//! ([`BusError`]), value validation ([`ValueError`]), configuration loading
//! ([`ConfigError`]). The top-level [`Error`] adds the bus context (service
//! and path) so log lines say exactly which property failed.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading a bus property failed.
    #[error("failed to read {service}{path}: {source}")]
    Read {
        /// Bus service that was queried.
        service: String,
        /// Object path of the property.
        path: String,
        /// Underlying bus failure.
        #[source]
        source: BusError,
    },

    /// Writing a bus property failed.
    #[error("failed to write {service}{path}: {source}")]
    Write {
        /// Bus service that was written to.
        service: String,
        /// Object path of the property.
        path: String,
        /// Underlying bus failure.
        #[source]
        source: BusError,
    },

    /// No relay slot carries one of the configured custom names.
    #[error("no relay with a matching custom name in {slots} slots")]
    RelayNotFound {
        /// Number of slots that were scanned.
        slots: u8,
    },

    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Wraps a bus failure that happened while reading `service``path`.
    pub(crate) fn read(service: &str, path: &str, source: BusError) -> Self {
        Self::Read {
            service: service.to_string(),
            path: path.to_string(),
            source,
        }
    }

    /// Wraps a bus failure that happened while writing `service``path`.
    pub(crate) fn write(service: &str, path: &str, source: BusError) -> Self {
        Self::Write {
            service: service.to_string(),
            path: path.to_string(),
            source,
        }
    }

    /// Returns the underlying bus error for read and write failures.
    #[must_use]
    pub fn bus_error(&self) -> Option<&BusError> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors reported by a bus client.
#[derive(Debug, Error)]
pub enum BusError {
    /// The service is not (yet) present on the bus.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service exists but does not expose the property.
    #[error("property {path} not found on {service}")]
    PropertyNotFound {
        /// Bus service that was queried.
        service: String,
        /// Object path that does not exist.
        path: String,
    },

    /// The property holds a value of an unexpected type.
    #[error("invalid value at {path}: {message}")]
    InvalidValue {
        /// Object path of the property.
        path: String,
        /// Description of the mismatch.
        message: String,
    },

    /// The service refused the write.
    #[error("write to {path} rejected with code {code}")]
    WriteRejected {
        /// Object path of the property.
        path: String,
        /// Return code reported by the service.
        code: i32,
    },

    /// D-Bus transport failure.
    #[cfg(feature = "dbus")]
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),
}

impl BusError {
    /// Returns `true` when the property simply does not exist.
    ///
    /// Scanning relay slots that are not fitted on the device produces this
    /// error routinely, so callers log it at a lower level than other
    /// failures.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PropertyNotFound { .. })
    }
}

/// Errors related to value validation and conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An invalid relay state string was provided.
    #[error("invalid relay state: {0}")]
    InvalidRelayState(String),

    /// A relay state number other than 0 or 1 was read.
    #[error("relay state {0} is out of range [0, 1]")]
    RelayStateOutOfRange(i64),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for this schema.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of its allowed domain.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

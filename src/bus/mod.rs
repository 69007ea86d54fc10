// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property bus clients.
//!
//! The controller only needs two operations from the gateway: read a
//! property and write an integer property. [`BusClient`] captures that
//! capability so the state machine can run against the real D-Bus or
//! against an in-memory registry.
//!
//! # Clients
//!
//! - [`MemoryBus`]: in-process property table, used by tests and dry runs
//! - `DbusClient`: Venus OS `com.victronenergy.BusItem` over the system bus
//!   (requires the `dbus` feature)

#[cfg(feature = "dbus")]
mod dbus;
mod memory;

#[cfg(feature = "dbus")]
pub use dbus::DbusClient;
pub use memory::MemoryBus;

use std::fmt;

use crate::error::BusError;

/// Interface implemented by every Venus OS bus item.
pub const BUS_ITEM_INTERFACE: &str = "com.victronenergy.BusItem";

/// Path of the active AC input source in the system service.
pub const ACTIVE_SOURCE_PATH: &str = "/Ac/ActiveIn/Source";

/// A value read from the bus.
#[derive(Debug, Clone, PartialEq)]
pub enum BusValue {
    /// Any integer-typed property.
    Int(i64),
    /// Floating point property.
    Double(f64),
    /// String property.
    Text(String),
    /// The property exists but currently has no value.
    Empty,
}

impl BusValue {
    /// Returns the value as an integer.
    ///
    /// A [`BusValue::Double`] with no fractional part is accepted, since some
    /// services publish integer codes as doubles (`1.0` reads as `1`).
    ///
    /// # Errors
    ///
    /// Returns `BusError::InvalidValue` for text, empty values and doubles
    /// that are fractional or outside the `i64` range.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::float_cmp
    )]
    pub fn as_int(&self, path: &str) -> Result<i64, BusError> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Double(v)
                if v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < i64::MAX as f64 =>
            {
                Ok(*v as i64)
            }
            other => Err(BusError::InvalidValue {
                path: path.to_string(),
                message: format!("expected integer, got {other}"),
            }),
        }
    }

    /// Returns the text if this is a string value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for BusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Empty => f.write_str("<empty>"),
        }
    }
}

impl From<i64> for BusValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for BusValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for BusValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for BusValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Capability to read and write gateway properties.
///
/// Calls are awaited one at a time by the controller; implementations do
/// not need to support concurrent use.
#[allow(async_fn_in_trait)]
pub trait BusClient {
    /// Reads the property at `path` on `service`.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the service or property is unavailable.
    async fn read_property(&self, service: &str, path: &str) -> Result<BusValue, BusError>;

    /// Writes an integer to the property at `path` on `service`.
    ///
    /// # Errors
    ///
    /// Returns `BusError` if the service is unavailable or rejects the write.
    async fn write_property(&self, service: &str, path: &str, value: i32)
    -> Result<(), BusError>;
}

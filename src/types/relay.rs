// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay addressing and state types.
//!
//! Relays are exposed by the gateway as numbered slots. The custom name of
//! a slot lives in the settings service, its switching state in the system
//! service.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Commanded or observed state of a relay.
///
/// # Examples
///
/// ```
/// use acwh_switch::types::RelayState;
///
/// assert_eq!(RelayState::On.as_num(), 1);
/// assert_eq!(RelayState::from(false), RelayState::Off);
/// assert_eq!("on".parse::<RelayState>().unwrap(), RelayState::On);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayState {
    /// Relay is open.
    Off,
    /// Relay is closed.
    On,
}

impl RelayState {
    /// Returns the lowercase name used in logs and on the command line.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Returns the value written to the `State` property.
    #[must_use]
    pub const fn as_num(&self) -> i32 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    /// Returns `true` for [`RelayState::On`].
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    /// Interprets a numeric `State` property value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::RelayStateOutOfRange` for anything but 0 or 1.
    pub fn from_num(value: i64) -> Result<Self, ValueError> {
        match value {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            other => Err(ValueError::RelayStateOutOfRange(other)),
        }
    }
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelayState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "0" | "false" => Ok(Self::Off),
            "on" | "1" | "true" => Ok(Self::On),
            _ => Err(ValueError::InvalidRelayState(s.to_string())),
        }
    }
}

impl From<bool> for RelayState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

/// Slot number of a relay on the device.
///
/// Slots are numbered from 0; the number is used verbatim in both
/// `/Settings/Relay/<n>/CustomName` and `/Relay/<n>/State`.
///
/// # Examples
///
/// ```
/// use acwh_switch::types::RelayIndex;
///
/// let idx = RelayIndex::new(3);
/// assert_eq!(idx.custom_name_path(), "/Settings/Relay/3/CustomName");
/// assert_eq!(idx.state_path(), "/Relay/3/State");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelayIndex(u8);

impl RelayIndex {
    /// Creates a relay index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Returns the numeric value of the index.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Path of the custom name property in the settings service.
    #[must_use]
    pub fn custom_name_path(&self) -> String {
        format!("/Settings/Relay/{}/CustomName", self.0)
    }

    /// Path of the switching state property in the system service.
    #[must_use]
    pub fn state_path(&self) -> String {
        format!("/Relay/{}/State", self.0)
    }
}

impl fmt::Display for RelayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

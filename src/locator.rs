// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay discovery by custom name.
//!
//! The settings service only exposes one property per relay slot, so the
//! locator walks the slots in ascending order and returns the first one
//! whose `CustomName` is in the configured target set.
//!
//! A slot whose name cannot be read is treated like a slot with a
//! non-matching name and the scan continues. A transient failure on the
//! right slot therefore looks like "no relay configured" for one scan; the
//! next scan will find it.

use crate::bus::BusClient;
use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::types::{RelayIndex, RelayState};

/// A relay found by [`RelayLocator::locate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRelay {
    /// Slot number of the relay.
    pub index: RelayIndex,
    /// Custom name that matched.
    pub name: String,
}

/// Scans relay slots for one of the target custom names.
///
/// The locator holds no state between calls; calling [`locate`](Self::locate)
/// again simply rescans.
///
/// # Examples
///
/// ```
/// use acwh_switch::bus::MemoryBus;
/// use acwh_switch::locator::RelayLocator;
/// use acwh_switch::ControllerConfig;
///
/// # async fn example() -> acwh_switch::Result<()> {
/// let bus = MemoryBus::new();
/// bus.set("com.victronenergy.settings", "/Settings/Relay/1/CustomName", "AC WH");
///
/// let config = ControllerConfig::default();
/// let relay = RelayLocator::new(&bus, &config).locate().await?;
/// assert_eq!(relay.index.value(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RelayLocator<'a, B> {
    bus: &'a B,
    config: &'a ControllerConfig,
}

impl<'a, B: BusClient> RelayLocator<'a, B> {
    /// Creates a locator over `bus` using the names and bounds in `config`.
    #[must_use]
    pub fn new(bus: &'a B, config: &'a ControllerConfig) -> Self {
        Self { bus, config }
    }

    /// Finds the first relay slot whose custom name is a target name.
    ///
    /// # Errors
    ///
    /// Returns `Error::RelayNotFound` when no slot in
    /// `0..max_relay_slots` matches.
    pub async fn locate(&self) -> Result<DiscoveredRelay> {
        let service = self.config.settings_service.as_str();

        for slot in 0..self.config.max_relay_slots {
            let index = RelayIndex::new(slot);
            let path = index.custom_name_path();

            let value = match self.bus.read_property(service, &path).await {
                Ok(value) => value,
                Err(e) if e.is_not_found() => {
                    tracing::debug!(relay = slot, path = %path, "Relay slot not present");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(
                        relay = slot,
                        service,
                        path = %path,
                        error = %e,
                        "Could not read relay custom name, skipping slot"
                    );
                    continue;
                }
            };

            if let Some(name) = value.as_text()
                && self.config.is_target_name(name)
            {
                tracing::info!(relay = slot, name, "Found water heater relay");
                return Ok(DiscoveredRelay {
                    index,
                    name: name.to_string(),
                });
            }
        }

        tracing::info!(
            names = ?self.config.target_names,
            slots = self.config.max_relay_slots,
            "Could not find a relay with a matching custom name"
        );
        Err(Error::RelayNotFound {
            slots: self.config.max_relay_slots,
        })
    }

    /// Reads the current switching state of a relay.
    ///
    /// # Errors
    ///
    /// Returns `Error::Read` if the state cannot be read, or
    /// `Error::Value` if it is not 0 or 1.
    pub async fn relay_state(&self, index: RelayIndex) -> Result<RelayState> {
        let service = self.config.system_service.as_str();
        let path = index.state_path();

        let raw = self
            .bus
            .read_property(service, &path)
            .await
            .and_then(|v| v.as_int(&path))
            .map_err(|e| Error::read(service, &path, e))?;

        Ok(RelayState::from_num(raw)?)
    }
}

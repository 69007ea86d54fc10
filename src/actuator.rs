// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relay switching.

use crate::bus::BusClient;
use crate::error::{Error, Result};
use crate::types::{RelayIndex, RelayState};

/// Writes relay states through a bus client.
///
/// Each call performs exactly one write; there is no retry.
#[derive(Debug)]
pub struct Actuator<'a, B> {
    bus: &'a B,
    service: &'a str,
}

impl<'a, B: BusClient> Actuator<'a, B> {
    /// Creates an actuator writing to `/Relay/<n>/State` on `service`.
    #[must_use]
    pub fn new(bus: &'a B, service: &'a str) -> Self {
        Self { bus, service }
    }

    /// Commands the relay at `index` to `state`.
    ///
    /// The outcome is logged either way.
    ///
    /// # Errors
    ///
    /// Returns `Error::Write` if the bus rejects or fails the write.
    pub async fn set_relay(&self, index: RelayIndex, state: RelayState) -> Result<()> {
        let path = index.state_path();

        match self
            .bus
            .write_property(self.service, &path, state.as_num())
            .await
        {
            Ok(()) => {
                tracing::info!(
                    relay = index.value(),
                    state = %state,
                    service = self.service,
                    path = %path,
                    "Set water heater relay"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    relay = index.value(),
                    state = %state,
                    service = self.service,
                    path = %path,
                    error = %e,
                    "Failed to set water heater relay"
                );
                Err(Error::write(self.service, &path, e))
            }
        }
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Discovery-then-monitor state machine.
//!
//! The controller moves through three phases, each driven by its own tick
//! interval:
//!
//! ```text
//!  Searching ──relay found──▶ Initializing ──source read──▶ Monitoring
//!   (every 2 s)                 (every 1 s)                  (every 5 s)
//! ```
//!
//! Each call to [`Controller::tick`] does one bounded piece of work for the
//! current phase and returns the phase to run next. [`Controller::run`]
//! sleeps for the current phase's interval and ticks, forever.
//!
//! # Decision rule
//!
//! The relay is switched on when the active AC input is grid or shore power
//! and off for every other source. The decision is recomputed from the
//! freshly read code each time it is taken.
//!
//! # Failure handling
//!
//! Nothing here stops the controller:
//!
//! - relay not found: keep searching
//! - source unreadable while initializing: retry on the next tick
//! - source unreadable while monitoring: warn and keep the last decision
//! - relay write failed: logged by the [`Actuator`]; the source code is
//!   still recorded, so the write is only retried after the next change
//!
//! # Examples
//!
//! ```
//! use acwh_switch::bus::MemoryBus;
//! use acwh_switch::controller::{Controller, Phase};
//! use acwh_switch::ControllerConfig;
//!
//! # async fn example() {
//! let bus = MemoryBus::new();
//! bus.set("com.victronenergy.settings", "/Settings/Relay/3/CustomName", "AC WH");
//! bus.set("com.victronenergy.system", "/Ac/ActiveIn/Source", 1);
//!
//! let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();
//! assert_eq!(controller.tick().await, Phase::Initializing);
//! assert_eq!(controller.tick().await, Phase::Monitoring);
//! # }
//! ```

mod state;

pub use state::{ControllerState, Phase};

use std::time::Duration;

use crate::actuator::Actuator;
use crate::bus::{ACTIVE_SOURCE_PATH, BusClient};
use crate::config::ControllerConfig;
use crate::error::{ConfigError, Error, Result};
use crate::locator::RelayLocator;
use crate::types::{RelayIndex, SourceCode, SourceLabel, classify};

/// Supervises the water-heater relay.
#[derive(Debug)]
pub struct Controller<B> {
    bus: B,
    config: ControllerConfig,
    state: ControllerState,
}

impl<B: BusClient> Controller<B> {
    /// Creates a controller in [`Phase::Searching`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `config` fails
    /// [`ControllerConfig::validate`], for example on a zero interval.
    pub fn new(bus: B, config: ControllerConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            bus,
            config,
            state: ControllerState::new(),
        })
    }

    /// Returns the controller state.
    #[must_use]
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Returns the bus client.
    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Returns how long to wait before the next tick in the current phase.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        match self.state.phase() {
            Phase::Searching => self.config.discovery_interval(),
            Phase::Initializing => self.config.initialization_interval(),
            Phase::Monitoring => self.config.monitoring_interval(),
        }
    }

    /// Runs the controller until the task is dropped.
    ///
    /// Every iteration sleeps for [`tick_interval`](Self::tick_interval)
    /// and then performs one [`tick`](Self::tick).
    pub async fn run(&mut self) {
        tracing::info!(
            names = ?self.config.target_names,
            slots = self.config.max_relay_slots,
            "Starting water heater controller"
        );

        loop {
            tokio::time::sleep(self.tick_interval()).await;
            self.tick().await;
        }
    }

    /// Performs one unit of work for the current phase.
    ///
    /// Returns the phase after the tick.
    pub async fn tick(&mut self) -> Phase {
        let before = self.state.phase();

        match (before, self.state.relay_index()) {
            (Phase::Searching, _) => self.search().await,
            (Phase::Initializing, Some(relay)) => self.initialize(relay).await,
            (Phase::Monitoring, Some(relay)) => self.monitor(relay).await,
            (phase, None) => {
                // Unreachable: leaving Searching always records the relay.
                tracing::error!(phase = %phase, "No relay recorded outside of discovery");
            }
        }

        let after = self.state.phase();
        if after != before {
            tracing::info!(from = %before, to = %after, "Controller phase changed");
        }
        after
    }

    async fn search(&mut self) {
        match RelayLocator::new(&self.bus, &self.config).locate().await {
            Ok(relay) => self.state.relay_found(relay),
            Err(e) => tracing::debug!(error = %e, "Relay discovery will retry"),
        }
    }

    async fn initialize(&mut self, relay: RelayIndex) {
        let code = match self.read_source().await {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(
                    relay = relay.value(),
                    error = %e,
                    "AC input source not available yet, retrying"
                );
                return;
            }
        };

        let label = classify(code);
        tracing::info!(code, label = %label, "Initial AC input source");
        self.apply(relay, label).await;
        self.state.initialized(code);
    }

    async fn monitor(&mut self, relay: RelayIndex) {
        let code = match self.read_source().await {
            Ok(code) => code,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read AC input source");
                return;
            }
        };

        let previous = self.state.last_observed_source();
        if previous == Some(code) {
            return;
        }

        let label = classify(code);
        match previous {
            Some(prev) => tracing::info!(
                previous_code = prev,
                previous = %classify(prev),
                code,
                label = %label,
                "AC input source changed"
            ),
            None => tracing::info!(code, label = %label, "AC input source changed"),
        }

        self.apply(relay, label).await;
        self.state.source_changed(code);
    }

    /// Commands the relay for `label`; failures are already logged.
    async fn apply(&self, relay: RelayIndex, label: SourceLabel) {
        let target = label.relay_target();
        let actuator = Actuator::new(&self.bus, &self.config.system_service);
        if actuator.set_relay(relay, target).await.is_err() {
            tracing::debug!(
                relay = relay.value(),
                state = %target,
                "Relay left unchanged until the next source change"
            );
        }
    }

    async fn read_source(&self) -> Result<SourceCode> {
        read_source_code(&self.bus, &self.config.system_service).await
    }
}

async fn read_source_code<B: BusClient>(bus: &B, service: &str) -> Result<SourceCode> {
    bus.read_property(service, ACTIVE_SOURCE_PATH)
        .await
        .and_then(|v| v.as_int(ACTIVE_SOURCE_PATH))
        .map_err(|e| Error::read(service, ACTIVE_SOURCE_PATH, e))
}

/// Reads and classifies the active AC input source once.
///
/// # Errors
///
/// Returns `Error::Read` if the source cannot be read as an integer.
pub async fn read_source_label<B: BusClient>(
    bus: &B,
    config: &ControllerConfig,
) -> Result<(SourceCode, SourceLabel)> {
    let code = read_source_code(bus, &config.system_service).await?;
    Ok((code, classify(code)))
}

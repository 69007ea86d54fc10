// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `acwh_switch` - switch a water heater from the active AC input source.
//!
//! On a Victron Venus OS gateway the water-heater relay is identified by
//! its custom name. This crate finds that relay, then watches the active AC
//! input source and keeps the relay on while the system runs on grid or
//! shore power, and off on generator, inverter or anything unknown.
//!
//! # Components
//!
//! - [`bus`]: the [`BusClient`] capability, an in-memory bus and (with the
//!   `dbus` feature) the Venus OS D-Bus client
//! - [`locator`]: bounded relay discovery by custom name
//! - [`types`]: relay types and the source classifier
//! - [`actuator`]: relay writes
//! - [`controller`]: the searching → initializing → monitoring state machine
//!
//! # Quick Start
//!
//! ```no_run
//! # #[cfg(feature = "dbus")]
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use acwh_switch::bus::DbusClient;
//! use acwh_switch::{Controller, ControllerConfig};
//!
//! let bus = DbusClient::system().await?;
//! let mut controller = Controller::new(bus, ControllerConfig::default())?;
//! controller.run().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Simulating
//!
//! ```
//! use acwh_switch::bus::MemoryBus;
//! use acwh_switch::controller::Phase;
//! use acwh_switch::{Controller, ControllerConfig};
//!
//! # async fn example() {
//! let bus = MemoryBus::new();
//! bus.set("com.victronenergy.settings", "/Settings/Relay/0/CustomName", "AC Water Heater");
//! bus.set("com.victronenergy.system", "/Ac/ActiveIn/Source", 2);
//!
//! let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();
//! controller.tick().await;
//! controller.tick().await;
//!
//! assert_eq!(controller.phase(), Phase::Monitoring);
//! assert_eq!(bus.writes()[0].2, 0); // generator: relay off
//! # }
//! ```

pub mod actuator;
pub mod bus;
pub mod config;
pub mod controller;
pub mod error;
pub mod locator;
pub mod types;

pub use actuator::Actuator;
pub use bus::{BusClient, BusValue, MemoryBus};
pub use config::ControllerConfig;
pub use controller::{Controller, ControllerState, Phase, read_source_label};
pub use error::{BusError, ConfigError, Error, Result, ValueError};
pub use locator::{DiscoveredRelay, RelayLocator};
pub use types::{RelayIndex, RelayState, SourceCode, SourceLabel, classify};

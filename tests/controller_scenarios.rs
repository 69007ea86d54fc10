// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end controller behavior against the in-memory bus.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use acwh_switch::bus::{ACTIVE_SOURCE_PATH, BusValue, MemoryBus};
use acwh_switch::controller::{Controller, Phase};
use acwh_switch::{ControllerConfig, RelayIndex};
use parking_lot::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

const SETTINGS: &str = "com.victronenergy.settings";
const SYSTEM: &str = "com.victronenergy.system";

fn name_path(slot: u8) -> String {
    RelayIndex::new(slot).custom_name_path()
}

fn state_path(slot: u8) -> String {
    RelayIndex::new(slot).state_path()
}

/// Relay 3 named "AC WH", source not yet published.
fn venus_bus() -> MemoryBus {
    let bus = MemoryBus::new();
    bus.set(SETTINGS, &name_path(0), "Alarm");
    bus.set(SETTINGS, &name_path(1), "");
    bus.set(SETTINGS, &name_path(3), "AC WH");
    bus
}

/// Drives a controller on `bus` into `Monitoring` with source `code`.
async fn monitoring_controller(bus: &MemoryBus, code: i64) -> Controller<MemoryBus> {
    bus.set(SYSTEM, ACTIVE_SOURCE_PATH, code);
    let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();
    assert_eq!(controller.tick().await, Phase::Initializing);
    assert_eq!(controller.tick().await, Phase::Monitoring);
    controller
}

fn relay_writes(bus: &MemoryBus) -> Vec<i32> {
    bus.writes().into_iter().map(|(_, _, value)| value).collect()
}

/// Formatted log output of the current thread, kept while the guard lives.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn capture() -> (Self, DefaultGuard) {
        let buffer = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }

    fn count(&self, level: &str, message: &str) -> usize {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .filter(|line| line.contains(level) && line.contains(message))
            .count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// ============================================================================
// Discovery
// ============================================================================

mod discovery {
    use super::*;

    #[tokio::test]
    async fn no_matching_relay_keeps_searching() {
        let bus = MemoryBus::new();
        for slot in 0..10 {
            bus.set(SETTINGS, &name_path(slot), format!("Relay {slot}"));
        }
        bus.set(SYSTEM, ACTIVE_SOURCE_PATH, 1);

        let (logs, _guard) = LogBuffer::capture();
        let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();
        for _ in 0..5 {
            assert_eq!(controller.tick().await, Phase::Searching);
        }

        assert_eq!(
            logs.count("INFO", "Could not find a relay with a matching custom name"),
            5
        );

        assert!(controller.state().relay().is_none());
        assert!(bus.writes().is_empty());
        assert_eq!(bus.read_count(SYSTEM, ACTIVE_SOURCE_PATH), 0);
        assert_eq!(bus.read_count(SETTINGS, &name_path(9)), 5);
    }

    #[tokio::test]
    async fn relay_appearing_late_is_found() {
        let bus = MemoryBus::new();
        let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();

        assert_eq!(controller.tick().await, Phase::Searching);
        assert_eq!(controller.tick().await, Phase::Searching);

        bus.set(SETTINGS, &name_path(6), "AC Water Heater");
        assert_eq!(controller.tick().await, Phase::Initializing);

        let relay = controller.state().relay().unwrap();
        assert_eq!(relay.index, RelayIndex::new(6));
        assert_eq!(relay.name, "AC Water Heater");
    }

    #[tokio::test]
    async fn unreadable_slots_before_match_do_not_change_result() {
        let bus = venus_bus();
        bus.fail_reads(SETTINGS, &name_path(0));
        bus.fail_reads(SETTINGS, &name_path(2));

        let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();
        controller.tick().await;

        assert_eq!(controller.state().relay_index(), Some(RelayIndex::new(3)));
    }

    #[tokio::test]
    async fn relay_index_is_never_replaced() {
        let bus = venus_bus();
        let mut controller = monitoring_controller(&bus, 1).await;

        // A lower slot taking the name later has no effect.
        bus.set(SETTINGS, &name_path(0), "AC WH");
        bus.set(SYSTEM, ACTIVE_SOURCE_PATH, 2);
        controller.tick().await;

        assert_eq!(controller.state().relay_index(), Some(RelayIndex::new(3)));
        assert!(bus.writes().iter().all(|(_, path, _)| *path == state_path(3)));
    }
}

// ============================================================================
// Initialization and monitoring
// ============================================================================

mod monitoring {
    use super::*;

    #[tokio::test]
    async fn grid_at_startup_switches_relay_on_once() {
        let bus = venus_bus();
        bus.set(SYSTEM, ACTIVE_SOURCE_PATH, 1);
        let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();

        assert_eq!(controller.tick().await, Phase::Initializing);
        assert_eq!(controller.tick().await, Phase::Monitoring);

        assert_eq!(
            bus.writes(),
            vec![(SYSTEM.to_string(), state_path(3), 1)]
        );
        assert_eq!(bus.get(SYSTEM, &state_path(3)), Some(BusValue::Int(1)));
        assert_eq!(controller.state().last_observed_source(), Some(1));
    }

    #[tokio::test]
    async fn generator_switches_relay_off() {
        let bus = venus_bus();
        let mut controller = monitoring_controller(&bus, 1).await;

        bus.set(SYSTEM, ACTIVE_SOURCE_PATH, 2);
        assert_eq!(controller.tick().await, Phase::Monitoring);

        assert_eq!(relay_writes(&bus), vec![1, 0]);
        assert_eq!(bus.writes()[1].1, state_path(3));
        assert_eq!(controller.state().last_observed_source(), Some(2));
    }

    #[tokio::test]
    async fn read_failure_while_monitoring_keeps_decision() {
        let bus = venus_bus();
        let mut controller = monitoring_controller(&bus, 1).await;
        let (logs, _guard) = LogBuffer::capture();

        bus.fail_reads(SYSTEM, ACTIVE_SOURCE_PATH);
        assert_eq!(controller.tick().await, Phase::Monitoring);
        assert_eq!(controller.tick().await, Phase::Monitoring);

        assert_eq!(relay_writes(&bus), vec![1]);
        assert_eq!(controller.state().last_observed_source(), Some(1));
        assert_eq!(logs.count("WARN", "Could not read AC input source"), 2);
    }

    #[tokio::test]
    async fn failed_relay_write_is_logged_as_error() {
        let bus = venus_bus();
        bus.set(SYSTEM, ACTIVE_SOURCE_PATH, 1);
        bus.fail_writes(SYSTEM, &state_path(3));
        let (logs, _guard) = LogBuffer::capture();

        let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();
        controller.tick().await;
        assert_eq!(controller.tick().await, Phase::Monitoring);

        assert_eq!(logs.count("ERROR", "Failed to set water heater relay"), 1);
        assert_eq!(logs.count("INFO", "Set water heater relay"), 0);
        assert_eq!(controller.state().last_observed_source(), Some(1));
    }

    #[tokio::test]
    async fn steady_source_is_debounced() {
        let bus = venus_bus();
        let mut controller = monitoring_controller(&bus, 3).await;

        for _ in 0..10 {
            controller.tick().await;
        }
        assert_eq!(relay_writes(&bus), vec![1]);
    }

    #[tokio::test]
    async fn every_change_is_actuated_fresh() {
        let bus = venus_bus();
        let mut controller = monitoring_controller(&bus, 0).await;

        // Shore (3) and shore (4) are distinct codes: both are written.
        for code in [240, 1, 3, 4, 4, 2, 99, 99, 1] {
            bus.set(SYSTEM, ACTIVE_SOURCE_PATH, code);
            controller.tick().await;
        }

        assert_eq!(relay_writes(&bus), vec![0, 0, 1, 1, 1, 0, 0, 1]);
        assert_eq!(controller.state().last_observed_source(), Some(1));
    }

    #[tokio::test]
    async fn recovered_read_after_failure_compares_with_last_decision() {
        let bus = venus_bus();
        let mut controller = monitoring_controller(&bus, 1).await;

        bus.fail_reads(SYSTEM, ACTIVE_SOURCE_PATH);
        controller.tick().await;
        bus.restore_reads(SYSTEM, ACTIVE_SOURCE_PATH);
        controller.tick().await;
        assert_eq!(relay_writes(&bus), vec![1]);

        bus.set(SYSTEM, ACTIVE_SOURCE_PATH, 240);
        controller.tick().await;
        assert_eq!(relay_writes(&bus), vec![1, 0]);
    }
}

// ============================================================================
// Scheduling
// ============================================================================

mod scheduling {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn run_follows_phase_intervals() {
        let bus = venus_bus();
        let mut controller = Controller::new(bus.clone(), ControllerConfig::default()).unwrap();

        // Discovery every 2 s; the source shows up after the relay is found.
        let _ = tokio::time::timeout(Duration::from_millis(2500), controller.run()).await;
        assert_eq!(controller.phase(), Phase::Initializing);
        assert!(bus.writes().is_empty());

        // Initialization retries every 1 s.
        bus.set(SYSTEM, ACTIVE_SOURCE_PATH, 4);
        let _ = tokio::time::timeout(Duration::from_millis(1500), controller.run()).await;
        assert_eq!(controller.phase(), Phase::Monitoring);
        assert_eq!(relay_writes(&bus), vec![1]);

        // Monitoring polls every 5 s.
        let reads_before = bus.read_count(SYSTEM, ACTIVE_SOURCE_PATH);
        let _ = tokio::time::timeout(Duration::from_millis(20_500), controller.run()).await;
        assert_eq!(bus.read_count(SYSTEM, ACTIVE_SOURCE_PATH) - reads_before, 4);
        assert_eq!(relay_writes(&bus), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_relay_polls_at_discovery_interval() {
        let bus = MemoryBus::new();
        let config = ControllerConfig::default().with_max_relay_slots(4);
        let mut controller = Controller::new(bus.clone(), config).unwrap();

        let _ = tokio::time::timeout(Duration::from_secs(61), controller.run()).await;

        assert_eq!(controller.phase(), Phase::Searching);
        assert_eq!(bus.read_count(SETTINGS, &name_path(0)), 30);
        assert_eq!(bus.read_count(SETTINGS, &name_path(4)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sub_second_interval_still_advances_time() {
        let bus = MemoryBus::new();
        let config = ControllerConfig::default()
            .with_max_relay_slots(2)
            .with_discovery_interval(Duration::from_millis(500));
        let mut controller = Controller::new(bus.clone(), config).unwrap();

        let result = tokio::time::timeout(Duration::from_millis(5500), controller.run()).await;

        assert!(result.is_err());
        assert_eq!(bus.read_count(SETTINGS, &name_path(0)), 5);
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `acwh-switch` service and inspection tool.
//!
//! ```bash
//! # Run the controller (default)
//! acwh-switch --log-file /data/ACWH_Switch/log
//!
//! # Inspect
//! acwh-switch find-relay
//! acwh-switch source
//!
//! # Switch the relay by hand
//! acwh-switch set-relay on
//! ```

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use acwh_switch::bus::DbusClient;
use acwh_switch::{
    Actuator, Controller, ControllerConfig, RelayLocator, RelayState, read_source_label,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "acwh-switch", version, about = "Water heater relay controller for Venus OS")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append logs to this file (overrides the configuration).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the controller until interrupted.
    Run,
    /// Locate the water heater relay and print its state.
    FindRelay,
    /// Read and classify the active AC input source.
    Source,
    /// Locate the water heater relay and switch it.
    SetRelay {
        /// `on` or `off`.
        state: RelayState,
    },
}

fn init_logging(log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ControllerConfig::from_json_file(path)?,
        None => ControllerConfig::default(),
    };
    if let Some(path) = cli.log_file {
        config.log_file = Some(path);
    }

    init_logging(config.log_file.as_deref())?;

    let bus = DbusClient::system().await?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let mut controller = Controller::new(bus, config)?;
            tokio::select! {
                () = controller.run() => {}
                result = tokio::signal::ctrl_c() => {
                    result?;
                    tracing::info!("Shutting down");
                }
            }
        }
        Command::FindRelay => {
            let locator = RelayLocator::new(&bus, &config);
            let relay = locator.locate().await?;
            let state = locator.relay_state(relay.index).await?;
            println!("Relay number: {}", relay.index);
            println!("Custom name:  '{}'", relay.name);
            println!("State:        {state}");
        }
        Command::Source => {
            let (code, label) = read_source_label(&bus, &config).await?;
            println!("Active AC input source: {label} (value: {code})");
        }
        Command::SetRelay { state } => {
            let relay = RelayLocator::new(&bus, &config).locate().await?;
            Actuator::new(&bus, &config.system_service)
                .set_relay(relay.index, state)
                .await?;
            println!("Water heater relay {} turned {state}.", relay.index);
        }
    }

    Ok(())
}

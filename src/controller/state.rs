// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller lifecycle state.

use std::fmt;

use crate::locator::DiscoveredRelay;
use crate::types::{RelayIndex, SourceCode};

/// Lifecycle phase of the controller.
///
/// Phases are ordered; the controller only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Scanning relay slots for the target name.
    Searching,
    /// Relay known; waiting for a first readable source code.
    Initializing,
    /// Initial decision applied; reacting to source changes.
    Monitoring,
}

impl Phase {
    /// Returns the phase name used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Searching => "searching",
            Self::Initializing => "initializing",
            Self::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State owned by the controller.
///
/// The relay is recorded exactly once, when leaving
/// [`Phase::Searching`]; the last observed source code is recorded when
/// leaving [`Phase::Initializing`] and updated on every change seen while
/// monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    phase: Phase,
    relay: Option<DiscoveredRelay>,
    last_observed_source: Option<SourceCode>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerState {
    /// Creates the initial state: searching, nothing recorded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Searching,
            relay: None,
            last_observed_source: None,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the discovered relay, once found.
    #[must_use]
    pub const fn relay(&self) -> Option<&DiscoveredRelay> {
        self.relay.as_ref()
    }

    /// Returns the index of the discovered relay, once found.
    #[must_use]
    pub fn relay_index(&self) -> Option<RelayIndex> {
        self.relay.as_ref().map(|r| r.index)
    }

    /// Returns the source code the last decision was based on.
    #[must_use]
    pub const fn last_observed_source(&self) -> Option<SourceCode> {
        self.last_observed_source
    }

    /// `Searching` → `Initializing`.
    pub(crate) fn relay_found(&mut self, relay: DiscoveredRelay) {
        debug_assert_eq!(self.phase, Phase::Searching);
        debug_assert!(self.relay.is_none());
        self.relay = Some(relay);
        self.phase = Phase::Initializing;
    }

    /// `Initializing` → `Monitoring`.
    pub(crate) fn initialized(&mut self, code: SourceCode) {
        debug_assert_eq!(self.phase, Phase::Initializing);
        self.last_observed_source = Some(code);
        self.phase = Phase::Monitoring;
    }

    /// Records a changed source code while monitoring.
    pub(crate) fn source_changed(&mut self, code: SourceCode) {
        debug_assert_eq!(self.phase, Phase::Monitoring);
        self.last_observed_source = Some(code);
    }
}

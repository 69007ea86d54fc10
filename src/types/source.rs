// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Active AC input source classification.
//!
//! The system service publishes `/Ac/ActiveIn/Source` as a bare integer.
//! [`classify`] maps it onto a closed set of labels, and
//! [`SourceLabel::relay_target`] turns a label into the relay command.

use std::fmt;

/// Raw value of `/Ac/ActiveIn/Source`.
pub type SourceCode = i64;

/// Semantic label of an active AC input source code.
///
/// # Examples
///
/// ```
/// use acwh_switch::types::{classify, RelayState, SourceLabel};
///
/// assert_eq!(classify(1), SourceLabel::Grid);
/// assert_eq!(classify(4), SourceLabel::Shore);
/// assert_eq!(classify(7), SourceLabel::Unknown(7));
/// assert_eq!(classify(240).relay_target(), RelayState::Off);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLabel {
    /// No AC input is available.
    Unavailable,
    /// Utility grid.
    Grid,
    /// Generator.
    Generator,
    /// Shore power.
    Shore,
    /// No AC input; the system is inverting from battery.
    Inverting,
    /// Any code outside the known set.
    Unknown(SourceCode),
}

impl SourceLabel {
    /// Returns the relay command for this source.
    ///
    /// The relay is switched on for grid and shore power only.
    #[must_use]
    pub const fn relay_target(&self) -> super::RelayState {
        match self {
            Self::Grid | Self::Shore => super::RelayState::On,
            _ => super::RelayState::Off,
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("Unavailable"),
            Self::Grid => f.write_str("Grid"),
            Self::Generator => f.write_str("Generator"),
            Self::Shore => f.write_str("Shore"),
            Self::Inverting => f.write_str("Inverting"),
            Self::Unknown(code) => write!(f, "Unknown ({code})"),
        }
    }
}

/// Classifies a raw source code.
#[must_use]
pub const fn classify(code: SourceCode) -> SourceLabel {
    match code {
        0 => SourceLabel::Unavailable,
        1 => SourceLabel::Grid,
        2 => SourceLabel::Generator,
        3 | 4 => SourceLabel::Shore,
        240 => SourceLabel::Inverting,
        other => SourceLabel::Unknown(other),
    }
}

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared by the locator, the actuator and the controller.
//!
//! # Types
//!
//! - [`RelayIndex`] - Slot number of a relay on the device (0-based)
//! - [`RelayState`] - On/Off state written to `/Relay/<n>/State`
//! - [`SourceCode`] - Raw active AC input source code
//! - [`SourceLabel`] - Semantic classification of a source code

mod relay;
mod source;

pub use relay::{RelayIndex, RelayState};
pub use source::{SourceCode, SourceLabel, classify};

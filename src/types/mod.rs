// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for climate unit control.
//!
//! This module provides type-safe representations of the values the units
//! accept. Each type ensures values are within their valid domain at
//! construction time, so an invalid staged or scripted value is rejected
//! before any request is sent.
//!
//! # Types
//!
//! - [`Power`] - On/Off (`pow`)
//! - [`Mode`] - Operating mode (`mode`)
//! - [`Temperature`] - Target temperature, 16.0-30.0 °C (`stemp`)
//! - [`FanRate`] - Fan speed (`f_rate`)
//! - [`FanDirection`] - Louver motion (`f_dir`)

mod fan;
mod mode;
mod power;
mod temperature;

pub use fan::{FanDirection, FanRate};
pub use mode::Mode;
pub use power::Power;
pub use temperature::Temperature;

/// Steps through a fixed sequence, wrapping at both ends.
///
/// A value missing from the sequence restarts from the first entry.
pub(crate) fn cycle<T: Copy + PartialEq>(seq: &[T], current: T, forward: bool) -> T {
    let len = seq.len();
    let idx = seq.iter().position(|v| *v == current).unwrap_or(0);
    let next = if forward {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    };
    seq[next]
}

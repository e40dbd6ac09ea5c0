// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interactive control of a fleet of units.
//!
//! The session is split in two:
//!
//! - [`ControlSession`] is a pure state machine. It holds the device list,
//!   the inspected unit's live values and one set of staged settings, and
//!   turns [`SessionEvent`]s into [`Effect`]s. It never performs I/O.
//! - [`SessionRuntime`] runs the state machine on tokio: it feeds keys and
//!   timer ticks in, runs the requested fetches and batch applies as
//!   tasks, and feeds their results back as events.
//!
//! Rendering is left to the application; [`SessionRuntime::run_with`]
//! calls back after every event with the current state.
//!
//! # Examples
//!
//! ```
//! use climctl::params::ControlSettings;
//! use climctl::session::{ControlSession, Effect, Key, Overlay, SessionEvent};
//!
//! let mut session = ControlSession::new(Vec::new(), ControlSettings::default());
//! assert!(session.start().is_none());
//!
//! session.update(SessionEvent::Key(Key::Char('h')));
//! assert_eq!(session.overlay(), Overlay::Help);
//!
//! let effect = session.update(SessionEvent::Key(Key::Char('q')));
//! assert_eq!(effect, Some(Effect::Quit));
//! ```

mod control;
mod key;
mod runtime;

pub use control::{ControlSession, Effect, SessionEvent};
pub use key::{Focus, HELP, Key, Overlay};
pub use runtime::SessionRuntime;

// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Protocol layer for communicating with climate units.
//!
//! Units expose three plain HTTP `GET` endpoints answering with
//! comma-separated `key=value` bodies. The [`ControlClient`] trait is the
//! seam used by discovery, the batch coordinator and the interactive
//! session; [`HttpControlClient`] is the network implementation.

#[cfg(feature = "http")]
mod http;
#[cfg(test)]
pub(crate) mod mock;

#[cfg(feature = "http")]
pub use http::HttpControlClient;

use std::future::Future;

use crate::error::ProtocolError;
use crate::params::{ControlInfo, SetControlCommand};

/// Basic info keys whose values are percent-encoded by the units.
const ENCODED_KEYS: [&str; 2] = ["name", "grp_name"];

/// Capability to query and control climate units.
///
/// Every call must complete or fail on its own timeout; callers never wait
/// indefinitely on a unit.
pub trait ControlClient: Send + Sync + 'static {
    /// Fetches the descriptive `basic_info` pairs of a unit.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` on connection failure, timeout or a
    /// non-success status.
    fn fetch_basic_info(
        &self,
        ip: &str,
    ) -> impl Future<Output = Result<ControlInfo, ProtocolError>> + Send;

    /// Fetches the live `control_info` pairs of a unit.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` on connection failure, timeout or a
    /// non-success status.
    fn fetch_control_info(
        &self,
        ip: &str,
    ) -> impl Future<Output = Result<ControlInfo, ProtocolError>> + Send;

    /// Sends a complete set-control request to a unit.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` on connection failure, timeout or a
    /// non-success status.
    fn set_control(
        &self,
        ip: &str,
        command: &SetControlCommand,
    ) -> impl Future<Output = Result<(), ProtocolError>> + Send;
}

/// Parses a `key=value,key=value` response body.
///
/// Pairs that do not contain exactly one `=` are skipped.
///
/// # Examples
///
/// ```
/// use climctl::protocol::parse_pairs;
///
/// let info = parse_pairs("ret=OK,pow=1,mode=4,bogus");
/// assert_eq!(info.get("pow").map(String::as_str), Some("1"));
/// assert!(!info.contains_key("bogus"));
/// ```
#[must_use]
pub fn parse_pairs(body: &str) -> ControlInfo {
    body.trim()
        .split(',')
        .filter_map(|pair| {
            let mut parts = pair.split('=');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) => Some((key.to_string(), value.to_string())),
                _ => None,
            }
        })
        .collect()
}

/// Parses a `basic_info` body, decoding the percent-encoded name fields.
#[must_use]
pub fn parse_basic_info(body: &str) -> ControlInfo {
    let mut info = parse_pairs(body);
    for key in ENCODED_KEYS {
        if let Some(value) = info.get_mut(key)
            && let Ok(decoded) = urlencoding::decode(value)
        {
            *value = decoded.into_owned();
        }
    }
    info
}

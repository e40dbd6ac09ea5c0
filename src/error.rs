// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `climctl` library.
//!
//! This module provides the error hierarchy used across the library: value
//! validation, protocol communication, the persisted history store, network
//! discovery and batch scripts.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to a climate unit.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while reading or writing the history store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error occurred while scanning the network.
    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Error occurred while loading a batch script.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// No device with the given MAC address is known to the store.
    #[error("device with MAC {0} not found")]
    DeviceNotFound(String),
}

/// Errors related to value validation and constraints.
///
/// These errors occur when a staged or scripted control value lies outside
/// the domain accepted by the climate units. They are always raised before
/// any request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: String,
        /// Maximum allowed value.
        max: String,
        /// The actual value that was provided.
        actual: String,
    },

    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPower(String),

    /// An unknown operating mode was provided.
    #[error("invalid mode: {0}")]
    InvalidMode(String),

    /// A temperature string could not be parsed.
    #[error("invalid temperature: {0}")]
    InvalidTemperature(String),

    /// An unknown fan rate was provided.
    #[error("invalid fan rate: {0}")]
    InvalidFanRate(String),

    /// An unknown fan direction was provided.
    #[error("invalid fan direction: {0}")]
    InvalidFanDirection(String),
}

/// Errors related to HTTP communication with a climate unit.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// The unit answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to the persisted device history.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the store file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file that was being accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The store file exists but does not contain a valid document.
    ///
    /// This is never recovered from silently; resetting the store would
    /// destroy the recorded history.
    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        /// The file that failed to parse.
        path: PathBuf,
        /// The JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory aggregate could not be serialized.
    #[error("failed to serialize store: {0}")]
    Serialize(#[source] serde_json::Error),

    /// No location for the store could be determined.
    #[error("could not determine a storage location")]
    NoStorageLocation,
}

/// Errors related to scanning the local network for units.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The scanning tool is not installed or not on `PATH`.
    #[error("{0} is not installed or not in PATH")]
    ToolNotInstalled(String),

    /// The requested network interface does not exist.
    #[error("interface {0} not found")]
    InterfaceNotFound(String),

    /// The scan ran but failed.
    #[error("scan failed: {0}")]
    ScanFailed(String),
}

/// Errors related to batch scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read.
    #[error("failed to read script file {path}: {source}")]
    Read {
        /// The script path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The script is not valid JSON or contains invalid values.
    #[error("failed to parse script: {0}")]
    Parse(#[from] serde_json::Error),

    /// The script contains no groups.
    #[error("script contains no groups")]
    NoGroups,

    /// A group operation was requested without any parameter.
    #[error("at least one parameter (power, mode, temp, fan-rate, fan-dir) must be provided")]
    NoParameters,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

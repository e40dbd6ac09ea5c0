// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP implementation of [`ControlClient`].

use reqwest::Client;

use crate::config::HttpConfig;
use crate::error::ProtocolError;
use crate::params::{ControlInfo, SetControlCommand};
use crate::protocol::{ControlClient, parse_basic_info, parse_pairs};

const BASIC_INFO_PATH: &str = "/common/basic_info";
const GET_CONTROL_PATH: &str = "/aircon/get_control_info";
const SET_CONTROL_PATH: &str = "/aircon/set_control_info";

/// HTTP client for climate units.
///
/// One client serves every unit; the address is supplied per call. The
/// configured timeout applies to each request.
///
/// # Examples
///
/// ```no_run
/// use climctl::config::HttpConfig;
/// use climctl::protocol::{ControlClient, HttpControlClient};
///
/// # async fn example() -> climctl::Result<()> {
/// let client = HttpControlClient::new(HttpConfig::default())?;
/// let info = client.fetch_control_info("192.168.1.40").await?;
/// println!("mode = {:?}", info.get("mode"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpControlClient {
    config: HttpConfig,
    client: Client,
}

impl HttpControlClient {
    /// Creates a client from the HTTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: HttpConfig) -> Result<Self, ProtocolError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(Self { config, client })
    }

    /// Returns the configuration used by this client.
    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn url(&self, ip: &str, path: &str) -> Result<String, ProtocolError> {
        if ip.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "unit address is empty".to_string(),
            ));
        }
        Ok(format!("{}{path}", self.config.base_url(ip)))
    }

    async fn get(&self, url: &str) -> Result<String, ProtocolError> {
        tracing::debug!(url = %url, "Sending HTTP request");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProtocolError::Timeout(
                    u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
                )
            } else if e.is_connect() {
                ProtocolError::ConnectionFailed(e.to_string())
            } else {
                ProtocolError::Http(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(ProtocolError::Http)?;

        if !status.is_success() {
            return Err(ProtocolError::Status {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(body = %body, "Received HTTP response");

        Ok(body)
    }
}

impl ControlClient for HttpControlClient {
    async fn fetch_basic_info(&self, ip: &str) -> Result<ControlInfo, ProtocolError> {
        let url = self.url(ip, BASIC_INFO_PATH)?;
        self.get(&url).await.map(|body| parse_basic_info(&body))
    }

    async fn fetch_control_info(&self, ip: &str) -> Result<ControlInfo, ProtocolError> {
        let url = self.url(ip, GET_CONTROL_PATH)?;
        self.get(&url).await.map(|body| parse_pairs(&body))
    }

    async fn set_control(&self, ip: &str, command: &SetControlCommand) -> Result<(), ProtocolError> {
        let url = format!("{}?{}", self.url(ip, SET_CONTROL_PATH)?, command.to_query());
        self.get(&url).await.map(|_| ())
    }
}

//! HTTP client for the LED controller
//!
//! Endpoints on the device:
//! - GET /         - connectivity probe
//! - GET /led/on   - switch LED on
//! - GET /led/off  - switch LED off
//!
//! Success is HTTP 200 and nothing else; no body is read.

use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use crate::config::LampConfig;
use crate::error::{LampError, Result};
use crate::types::LedCommand;

/// Client bound to one device. Built once at startup and shared.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    host: String,
    base_url: String,
    command_timeout: Duration,
    probe_timeout: Duration,
}

impl DeviceClient {
    pub fn new(host: &str, command_timeout: Duration, probe_timeout: Duration) -> Result<Self> {
        // LAN device: never route through a system proxy
        let http = reqwest::Client::builder().no_proxy().build()?;
        let host = host.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url: format!("http://{}", host),
            host,
            command_timeout,
            probe_timeout,
        })
    }

    pub fn from_config(config: &LampConfig) -> Result<Self> {
        Self::new(
            &config.device_host,
            config.dispatch_timeout(),
            config.probe_timeout(),
        )
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn command_url(&self, command: LedCommand) -> String {
        format!("{}{}", self.base_url, command.path())
    }

    /// GET / with the probe timeout. Ok only on 200.
    pub async fn probe(&self) -> Result<()> {
        let url = format!("{}/", self.base_url);
        debug!(%url, "probing device");

        let resp = self
            .http
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|source| LampError::DeviceUnreachable {
                host: self.host.clone(),
                source,
            })?;

        if resp.status() != StatusCode::OK {
            return Err(LampError::DeviceStatus {
                host: self.host.clone(),
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }

    /// One GET to /led/on or /led/off with the command timeout. No retry.
    pub async fn send(&self, command: LedCommand) -> Result<()> {
        let url = self.command_url(command);
        debug!(%url, "sending command");

        let resp = self
            .http
            .get(&url)
            .timeout(self.command_timeout)
            .send()
            .await
            .map_err(|e| LampError::Dispatch {
                command: command.tag().to_string(),
                reason: e.to_string(),
            })?;

        if resp.status() != StatusCode::OK {
            return Err(LampError::Dispatch {
                command: command.tag().to_string(),
                reason: format!("HTTP {}", resp.status().as_u16()),
            });
        }
        Ok(())
    }
}

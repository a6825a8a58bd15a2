//! Runtime configuration
//!
//! Built-in defaults, optionally overlaid by a JSON file, then by CLI flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LampError, Result};
use crate::{
    BRIGHTNESS_HIGH, BRIGHTNESS_LOW, CAPTURE_HEIGHT, CAPTURE_RETRY_MS, CAPTURE_WIDTH,
    COOLDOWN_MS, DEFAULT_CAMERA_INDEX, DEFAULT_DEVICE_HOST, DISPATCH_TIMEOUT_MS,
    FALLBACK_CAMERA_INDICES, FRAME_STRIDE, PROBE_TIMEOUT_MS,
};

/// Facelamp configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LampConfig {
    /// LED controller host, optionally with port (e.g. "192.168.1.12:8000")
    pub device_host: String,

    /// Minimum dwell between emitted commands (milliseconds)
    pub cooldown_ms: u64,

    /// Timeout for /led/on and /led/off (milliseconds)
    pub dispatch_timeout_ms: u64,

    /// Timeout for the startup probe (milliseconds)
    pub probe_timeout_ms: u64,

    /// Exclusive lower bound of accepted mean brightness
    pub brightness_low: f64,

    /// Exclusive upper bound of accepted mean brightness
    pub brightness_high: f64,

    /// Process every Nth captured frame
    pub frame_stride: u32,

    /// Sleep after a failed frame read (milliseconds)
    pub capture_retry_ms: u64,

    /// Camera tried first
    pub camera_index: i32,

    /// Cameras tried when the first one does not open
    pub fallback_camera_indices: Vec<i32>,

    pub frame_width: u32,
    pub frame_height: u32,

    /// Haar cascade file; well-known install locations are searched when unset
    pub cascade_path: Option<PathBuf>,

    /// Show the debug preview window
    pub preview: bool,
}

impl Default for LampConfig {
    fn default() -> Self {
        Self {
            device_host: DEFAULT_DEVICE_HOST.to_string(),
            cooldown_ms: COOLDOWN_MS,
            dispatch_timeout_ms: DISPATCH_TIMEOUT_MS,
            probe_timeout_ms: PROBE_TIMEOUT_MS,
            brightness_low: BRIGHTNESS_LOW,
            brightness_high: BRIGHTNESS_HIGH,
            frame_stride: FRAME_STRIDE,
            capture_retry_ms: CAPTURE_RETRY_MS,
            camera_index: DEFAULT_CAMERA_INDEX,
            fallback_camera_indices: FALLBACK_CAMERA_INDICES.to_vec(),
            frame_width: CAPTURE_WIDTH,
            frame_height: CAPTURE_HEIGHT,
            cascade_path: None,
            preview: true,
        }
    }
}

impl LampConfig {
    /// Load a JSON file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: LampConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the loop cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.device_host.trim().is_empty() {
            return Err(LampError::Config("device_host must not be empty".into()));
        }
        if self.device_host.contains("://") {
            return Err(LampError::Config(format!(
                "device_host '{}' must be a bare host, without scheme",
                self.device_host
            )));
        }
        if !(self.brightness_low < self.brightness_high) {
            return Err(LampError::Config(format!(
                "brightness_low ({}) must be below brightness_high ({})",
                self.brightness_low, self.brightness_high
            )));
        }
        if self.frame_stride == 0 {
            return Err(LampError::Config("frame_stride must be at least 1".into()));
        }
        if self.dispatch_timeout_ms == 0 || self.probe_timeout_ms == 0 {
            return Err(LampError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    /// Base URL of the device, e.g. "http://192.168.1.12"
    pub fn base_url(&self) -> String {
        format!("http://{}", self.device_host.trim_end_matches('/'))
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn capture_retry(&self) -> Duration {
        Duration::from_millis(self.capture_retry_ms)
    }

    /// Camera indices in the order they should be tried
    pub fn camera_candidates(&self) -> Vec<i32> {
        let mut indices = vec![self.camera_index];
        for &i in &self.fallback_camera_indices {
            if !indices.contains(&i) {
                indices.push(i);
            }
        }
        indices
    }
}

//! Facelamp: switch a networked LED when a face is in front of the camera
//!
//! frame → FaceDetector → brightness band → PresenceActuator → CommandSink

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::LampConfig;
pub use error::{LampError, Result};

// =============================================================================
// BRIGHTNESS BAND - mean luminance on a 0-255 scale, both bounds exclusive
// =============================================================================

/// Candidates at or below this mean are treated as underexposed
pub const BRIGHTNESS_LOW: f64 = 30.0;

/// Candidates at or above this mean are treated as overexposed
pub const BRIGHTNESS_HIGH: f64 = 220.0;

// =============================================================================
// TIMING
// =============================================================================

/// Minimum dwell between two emitted LED commands (milliseconds)
pub const COOLDOWN_MS: u64 = 2000;

/// Timeout for a single /led/on or /led/off request (milliseconds)
pub const DISPATCH_TIMEOUT_MS: u64 = 2000;

/// Timeout for the startup connectivity probe (milliseconds)
pub const PROBE_TIMEOUT_MS: u64 = 3000;

/// Delay before retrying after a failed frame read (milliseconds)
pub const CAPTURE_RETRY_MS: u64 = 500;

/// Grace period for in-flight commands after the loop exits (milliseconds)
pub const SHUTDOWN_GRACE_MS: u64 = DISPATCH_TIMEOUT_MS + 500;

// =============================================================================
// CAPTURE
// =============================================================================

/// Only every Nth frame is run through detection
pub const FRAME_STRIDE: u32 = 2;

/// Requested capture resolution
pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

/// Camera tried first
pub const DEFAULT_CAMERA_INDEX: i32 = 0;

/// Cameras probed in order when the default one does not open
pub const FALLBACK_CAMERA_INDICES: [i32; 4] = [1, 2, 3, 4];

// =============================================================================
// DEVICE
// =============================================================================

/// Address of the LED controller on the local network
pub const DEFAULT_DEVICE_HOST: &str = "192.168.1.12";

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";

//! Error types for facelamp
use thiserror::Error;

/// Everything that can go wrong between the camera and the LED
#[derive(Error, Debug)]
pub enum LampError {
    /// Probe could not reach the device at all
    #[error("device at {host} is unreachable: {source}")]
    DeviceUnreachable {
        host: String,
        #[source]
        source: reqwest::Error,
    },

    /// Device answered, but not with 200
    #[error("device at {host} answered with HTTP {status}")]
    DeviceStatus { host: String, status: u16 },

    /// A single /led/on or /led/off request failed
    #[error("dispatch of '{command}' failed: {reason}")]
    Dispatch { command: String, reason: String },

    /// HTTP client construction or transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No camera index could be opened
    #[error("no camera available (tried indices {tried:?})")]
    NoCamera { tried: Vec<i32> },

    /// A frame could not be read; transient
    #[error("capture error: {0}")]
    Capture(String),

    /// Cascade classifier missing or corrupt
    #[error("detector initialization failed: {0}")]
    DetectorInit(String),

    /// Detector failed on one frame; transient
    #[error("detection error: {0}")]
    Detection(String),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LampError {
    /// Errors the loop absorbs instead of stopping
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LampError::Capture(_) | LampError::Detection(_) | LampError::Dispatch { .. }
        )
    }
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for LampError {
    fn from(e: opencv::Error) -> Self {
        LampError::Capture(e.to_string())
    }
}

/// Result type for facelamp operations
pub type Result<T> = std::result::Result<T, LampError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LampError::Capture("no frame".into()).is_transient());
        assert!(LampError::Detection("bad roi".into()).is_transient());
        assert!(LampError::Dispatch {
            command: "on".into(),
            reason: "timeout".into()
        }
        .is_transient());
        assert!(!LampError::DetectorInit("missing".into()).is_transient());
        assert!(!LampError::NoCamera { tried: vec![0] }.is_transient());
    }

    #[test]
    fn test_status_message_names_host() {
        let err = LampError::DeviceStatus {
            host: "10.0.0.5".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "device at 10.0.0.5 answered with HTTP 404");
    }
}

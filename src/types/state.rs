//! Lamp state definitions

use serde::{Deserialize, Serialize};

/// Last commanded (assumed) state of the remote LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LampState {
    /// Initial state; no face seen or face gone
    Off,
    /// Face present, "on" was sent
    On,
}

impl LampState {
    pub fn is_on(&self) -> bool {
        matches!(self, LampState::On)
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            LampState::Off => "\x1b[90m", // Gray
            LampState::On => "\x1b[32m",  // Green
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LampState::Off => "⚫",
            LampState::On => "💡",
        }
    }
}

impl std::fmt::Display for LampState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LampState::Off => "OFF",
            LampState::On => "ON",
        };
        write!(f, "{}", name)
    }
}

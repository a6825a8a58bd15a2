//! Commands sent to the LED controller

use serde::{Deserialize, Serialize};
use crate::types::LampState;

/// One outbound command to the remote LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedCommand {
    On,
    Off,
}

impl LedCommand {
    /// Tag as used in the URL and in logs
    pub fn tag(&self) -> &'static str {
        match self {
            LedCommand::On => "on",
            LedCommand::Off => "off",
        }
    }

    /// Request path on the device
    pub fn path(&self) -> &'static str {
        match self {
            LedCommand::On => "/led/on",
            LedCommand::Off => "/led/off",
        }
    }

    /// State the lamp is assumed to be in once this command was sent
    pub fn target_state(&self) -> LampState {
        match self {
            LedCommand::On => LampState::On,
            LedCommand::Off => LampState::Off,
        }
    }
}

impl From<LampState> for LedCommand {
    fn from(state: LampState) -> Self {
        match state {
            LampState::On => LedCommand::On,
            LampState::Off => LedCommand::Off,
        }
    }
}

impl std::fmt::Display for LedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

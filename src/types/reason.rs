//! Reason codes for actuator decisions

use serde::{Deserialize, Serialize};

/// Why a processed frame did or did not change the lamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // L001: Transitions
    // =========================================================================
    /// Face present while OFF, cooldown elapsed → ON
    L001_PRESENCE_CONFIRMED,
    /// No valid face while ON, cooldown elapsed → OFF
    L001_PRESENCE_LOST,

    // =========================================================================
    // L002: Steady state
    // =========================================================================
    /// Face present and lamp already ON
    L002_HOLDING_ON,
    /// No face and lamp already OFF
    L002_HOLDING_OFF,

    // =========================================================================
    // L003: Debounce
    // =========================================================================
    /// Presence changed, but the cooldown has not elapsed yet
    L003_COOLDOWN_ACTIVE,

    // =========================================================================
    // L004: Lifecycle
    // =========================================================================
    /// Loop stopped, OFF forced
    L004_SHUTDOWN,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::L001_PRESENCE_CONFIRMED => "L001_PRESENCE_CONFIRMED",
            Self::L001_PRESENCE_LOST => "L001_PRESENCE_LOST",
            Self::L002_HOLDING_ON => "L002_HOLDING_ON",
            Self::L002_HOLDING_OFF => "L002_HOLDING_OFF",
            Self::L003_COOLDOWN_ACTIVE => "L003_COOLDOWN_ACTIVE",
            Self::L004_SHUTDOWN => "L004_SHUTDOWN",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::L001_PRESENCE_CONFIRMED => "Face detected - lamp on",
            Self::L001_PRESENCE_LOST => "Face gone - lamp off",
            Self::L002_HOLDING_ON => "Face still present",
            Self::L002_HOLDING_OFF => "Nobody there",
            Self::L003_COOLDOWN_ACTIVE => "Change suppressed during cooldown",
            Self::L004_SHUTDOWN => "Shutting down - lamp off",
        }
    }

    /// Did this decision emit a command?
    pub fn is_transition(&self) -> bool {
        matches!(
            self,
            Self::L001_PRESENCE_CONFIRMED | Self::L001_PRESENCE_LOST | Self::L004_SHUTDOWN
        )
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

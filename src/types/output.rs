//! Per-frame actuator output

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{LampState, LedCommand, ReasonCode};

/// Result of feeding one presence value to the actuator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutput {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Validated presence for this frame
    pub presence: bool,
    /// State after the step
    pub state: LampState,
    /// Command to dispatch, if the step was a transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<LedCommand>,
    /// Reason for the decision
    pub reason: ReasonCode,
    /// Time left before another transition is allowed (milliseconds)
    pub cooldown_remaining_ms: u64,
}

impl StepOutput {
    /// Create new output
    pub fn new(
        presence: bool,
        state: LampState,
        command: Option<LedCommand>,
        reason: ReasonCode,
        cooldown_remaining_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            presence,
            state,
            command,
            reason,
            cooldown_remaining_ms,
        }
    }

    pub fn is_transition(&self) -> bool {
        self.command.is_some()
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.state.color_code();
        let reset = LampState::color_reset();

        format!(
            "{}{} [{}] face={} | lamp={} | cooldown={:.1}s | {}{}",
            color,
            self.state.emoji(),
            self.timestamp.format("%H:%M:%S"),
            if self.presence { "yes" } else { "no" },
            self.state,
            self.cooldown_remaining_ms as f64 / 1000.0,
            self.reason.code(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "time={} | face={} | lamp={} | command={} | reason={}",
            self.timestamp.format("%H:%M:%S"),
            self.presence,
            self.state,
            self.command.map(|c| c.tag()).unwrap_or("-"),
            self.reason.code()
        )
    }
}

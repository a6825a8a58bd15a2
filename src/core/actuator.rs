//! Presence actuator: two-state machine with a cooldown between commands
//!
//! State transitions:
//! - OFF → ON:  face present AND cooldown elapsed
//! - ON → OFF:  no valid face AND cooldown elapsed
//! - otherwise: hold (presence flicker inside the cooldown is ignored)
//!
//! "Elapsed" is strict: exactly `cooldown` after the last transition is not enough.

use std::time::{Duration, Instant};
use crate::COOLDOWN_MS;
use crate::types::{LampState, LedCommand, ReasonCode, StepOutput};

/// Transition detector holding the assumed lamp state
#[derive(Debug)]
pub struct PresenceActuator {
    /// Last commanded state
    state: LampState,
    /// When the last command was emitted; None until the first one
    last_transition: Option<Instant>,
    /// Minimum dwell between commands
    cooldown: Duration,
    /// Presence seen on the last update
    last_presence: bool,
    /// Number of updates
    update_count: u64,
    /// Number of emitted commands, shutdown included
    transition_count: u64,
}

impl Default for PresenceActuator {
    fn default() -> Self {
        Self::new(Duration::from_millis(COOLDOWN_MS))
    }
}

impl PresenceActuator {
    /// Create actuator in OFF
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: LampState::Off,
            last_transition: None,
            cooldown,
            last_presence: false,
            update_count: 0,
            transition_count: 0,
        }
    }

    /// Update with this frame's validated presence
    pub fn update(&mut self, presence: bool) -> StepOutput {
        self.update_at(presence, Instant::now())
    }

    /// Update with an explicit frame time
    pub fn update_at(&mut self, presence: bool, now: Instant) -> StepOutput {
        self.last_presence = presence;
        self.update_count += 1;

        let cooled = self.cooldown_elapsed(now);
        let (new_state, reason) = self.compute_transition(presence, cooled);

        let command = if new_state != self.state {
            self.state = new_state;
            self.last_transition = Some(now);
            self.transition_count += 1;
            Some(LedCommand::from(new_state))
        } else {
            None
        };

        StepOutput::new(
            presence,
            self.state,
            command,
            reason,
            self.cooldown_remaining_at(now).as_millis() as u64,
        )
    }

    /// Compute next state from presence and cooldown
    fn compute_transition(&self, presence: bool, cooled: bool) -> (LampState, ReasonCode) {
        match self.state {
            LampState::Off => {
                if !presence {
                    (LampState::Off, ReasonCode::L002_HOLDING_OFF)
                } else if cooled {
                    (LampState::On, ReasonCode::L001_PRESENCE_CONFIRMED)
                } else {
                    (LampState::Off, ReasonCode::L003_COOLDOWN_ACTIVE)
                }
            }

            LampState::On => {
                if presence {
                    (LampState::On, ReasonCode::L002_HOLDING_ON)
                } else if cooled {
                    (LampState::Off, ReasonCode::L001_PRESENCE_LOST)
                } else {
                    (LampState::On, ReasonCode::L003_COOLDOWN_ACTIVE)
                }
            }
        }
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_transition {
            None => true,
            Some(at) => now.saturating_duration_since(at) > self.cooldown,
        }
    }

    /// Time left before a transition is allowed at `now`
    pub fn cooldown_remaining_at(&self, now: Instant) -> Duration {
        match self.last_transition {
            None => Duration::ZERO,
            Some(at) => self.cooldown.saturating_sub(now.saturating_duration_since(at)),
        }
    }

    /// Force OFF on loop exit. Always returns the OFF command, cooldown or not.
    pub fn shutdown(&mut self) -> StepOutput {
        self.shutdown_at(Instant::now())
    }

    pub fn shutdown_at(&mut self, now: Instant) -> StepOutput {
        self.state = LampState::Off;
        self.last_transition = Some(now);
        self.transition_count += 1;
        StepOutput::new(
            false,
            LampState::Off,
            Some(LedCommand::Off),
            ReasonCode::L004_SHUTDOWN,
            self.cooldown.as_millis() as u64,
        )
    }

    /// Get current state
    pub fn state(&self) -> LampState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state.is_on()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_transition(&self) -> Option<Instant> {
        self.last_transition
    }

    pub fn last_presence(&self) -> bool {
        self.last_presence
    }

    /// Get update count
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }

    /// Reset to OFF without emitting anything
    pub fn reset(&mut self) {
        *self = Self::new(self.cooldown);
    }
}

// =============================================================================
// TESTS
// =============================================================================

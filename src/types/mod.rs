//! Core types for facelamp

mod state;
mod command;
mod candidate;
mod output;
mod reason;

pub use state::LampState;
pub use command::LedCommand;
pub use candidate::{Candidate, Frame};
pub use output::StepOutput;
pub use reason::ReasonCode;

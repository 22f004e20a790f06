//! Agent module - the run loop and its supporting pieces.
//!
//! [`Agent`] owns the conversation state machine; [`OutputContract`] turns a
//! caller type into a forced synthetic tool plus validator; the dispatcher
//! executes one round's tool calls concurrently while preserving request
//! order in the outcomes.

mod dispatch;
mod runner;
mod structured;

pub use runner::{Agent, AgentBuilder, RunOptions, RunOutput, RunResult};
pub use structured::OutputContract;

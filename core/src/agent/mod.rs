//! Guardrailed agent core
//!
//! One turn flows through three stages: the input guardrail screens the user
//! message, the model/tool loop produces a candidate reply, and the output
//! guardrail screens that reply before it reaches the caller.

pub mod builder;
pub mod config;
pub mod core;
pub mod execution;

pub use builder::AgentBuilder;
pub use config::AgentConfig;
pub use core::AgentCore;
pub use execution::{TurnDisposition, TurnExecution};

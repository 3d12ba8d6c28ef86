//! # Robodesk Core
//!
//! Core library for Robodesk - a guardrailed conversational agent that
//! answers questions about an industrial robotics product line.
//!
//! The library wires four pieces together:
//! - a tool provider that resolves remote capabilities (document retrieval)
//!   from an MCP registry plus built-in tools (email, scoped web search),
//! - a prompt source holding the assistant's system instructions,
//! - two guardrail stages that screen the inbound user message and the
//!   outbound assistant reply, substituting a fixed refusal on block,
//! - a bounded conversational loop that calls the model, dispatches tool
//!   calls, and returns the final (screened) answer.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod guardrails;
pub mod llm;
pub mod prompts;
pub mod tools;

// Re-export commonly used types
pub use agent::{AgentBuilder, AgentConfig, AgentCore, TurnDisposition, TurnExecution};
pub use config::Settings;
pub use guardrails::{GuardrailStage, InputGuardrail, OutputGuardrail, Verdict};

/// Current version of the robodesk-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

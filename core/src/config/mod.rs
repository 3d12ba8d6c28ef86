//! Configuration for the agent, its model providers, and its tools
//!
//! Core only accepts fully resolved, validated configuration. All values come
//! from environment variables; there are no config files and no CLI flags.

pub mod settings;
pub mod types;

pub use settings::{EmailSettings, McpSettings, SearchSettings, Settings};
pub use types::{ModelParams, ResolvedLlmConfig};

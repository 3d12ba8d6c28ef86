//! Error types and handling for Robodesk Core

use thiserror::Error;

/// Result type alias for Robodesk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Robodesk Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool resolution and execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Guardrail evaluation errors
    #[error("Guardrail error: {0}")]
    Guardrail(#[from] GuardrailError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {name}")]
    MissingEnv { name: String },

    #[error("Invalid value for '{name}': {value}")]
    InvalidValue { name: String, value: String },

    #[error("Prompt file not found: {path}")]
    PromptFileNotFound { path: String },

    #[error("Unknown prompt: {name}. Available: {available}")]
    UnknownPrompt { name: String, available: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },
}

/// Tool resolution and execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },

    #[error("Tool registry unreachable: {message}")]
    RegistryUnreachable { message: String },
}

/// Guardrail evaluation errors
///
/// A classifier failure surfaces here so the stage can fail closed;
/// it is never shown to the end user directly.
#[derive(Error, Debug)]
pub enum GuardrailError {
    #[error("Classifier call failed: {message}")]
    ClassifierFailed { message: String },

    #[error("Malformed classifier verdict: {verdict}")]
    MalformedVerdict { verdict: String },
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent not initialized")]
    NotInitialized,
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}

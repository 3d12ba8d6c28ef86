//! Environment-driven application settings
//!
//! The full configuration surface is environment variables: model selection,
//! sampling parameters, and all third-party credentials. Tools backed by
//! third-party services (email, web search) are only registered when their
//! credentials are present.

use std::env;
use std::path::PathBuf;

use crate::config::types::{ModelParams, ResolvedLlmConfig};
use crate::error::{ConfigError, Result};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_GUARDRAIL_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MCP_URL: &str = "https://rshp-mcp.fly.dev/mcp";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 2000;
const DEFAULT_MAX_STEPS: usize = 10;

/// MCP tool registry settings
#[derive(Debug, Clone)]
pub struct McpSettings {
    /// Registry name used in diagnostics
    pub name: String,
    /// Streamable HTTP endpoint of the registry
    pub url: String,
    /// Tool names to select from the registry
    pub selected_tools: Vec<String>,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

/// Email provider settings
#[derive(Debug, Clone)]
pub struct EmailSettings {
    /// API key for the sending provider
    pub api_key: String,
    /// Sender address registered with the provider
    pub from_address: String,
    /// Provider endpoint
    pub base_url: String,
}

/// Web search provider settings
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// API key for the search provider
    pub api_key: String,
    /// Only results from these domains may be searched
    pub allowed_domains: Vec<String>,
    /// Provider endpoint
    pub base_url: String,
}

/// Fully resolved application settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Primary conversational model
    pub llm: ResolvedLlmConfig,
    /// Secondary safety-classifier model (same provider endpoint)
    pub guardrail_model: String,
    /// Maximum model/tool iterations per turn
    pub max_steps: usize,
    /// Remote tool registry
    pub mcp: McpSettings,
    /// Email tool, registered only when configured
    pub email: Option<EmailSettings>,
    /// Web search tool, registered only when configured
    pub search: Option<SearchSettings>,
    /// System prompt file; the built-in prompt registry is used when unset
    pub prompt_path: Option<PathBuf>,
}

impl Settings {
    /// Resolve settings from the process environment
    pub fn from_env() -> Result<Self> {
        let api_key = require_env("OPENAI_API_KEY")?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("AGENT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let params = ModelParams {
            max_tokens: Some(parse_env("AGENT_MAX_TOKENS", DEFAULT_MAX_TOKENS)?),
            temperature: Some(parse_env("AGENT_TEMPERATURE", DEFAULT_TEMPERATURE)?),
            top_p: None,
        };

        let llm = ResolvedLlmConfig::new(base_url, api_key, model).with_params(params);
        if let Err(message) = llm.validate() {
            return Err(ConfigError::InvalidValue {
                name: "model configuration".to_string(),
                value: message,
            }
            .into());
        }

        let guardrail_model =
            env::var("GUARDRAIL_MODEL").unwrap_or_else(|_| DEFAULT_GUARDRAIL_MODEL.to_string());

        let mcp = McpSettings {
            name: "rag".to_string(),
            url: env::var("RAG_MCP_URL").unwrap_or_else(|_| DEFAULT_MCP_URL.to_string()),
            selected_tools: csv_env("RAG_MCP_TOOLS", &["retrieve_documents"]),
            timeout_secs: parse_env("RAG_MCP_TIMEOUT_SECS", 30u64)?,
        };

        let email = match (env::var("EMAIL_API_KEY"), env::var("EMAIL_FROM")) {
            (Ok(api_key), Ok(from_address)) => Some(EmailSettings {
                api_key,
                from_address,
                base_url: env::var("EMAIL_BASE_URL")
                    .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            }),
            _ => None,
        };

        let search = env::var("SEARCH_API_KEY").ok().map(|api_key| SearchSettings {
            api_key,
            allowed_domains: csv_env(
                "SEARCH_ALLOWED_DOMAINS",
                &["motoman.com", "yaskawa.com", "yaskawa-global.com"],
            ),
            base_url: env::var("SEARCH_BASE_URL")
                .unwrap_or_else(|_| "https://api.tavily.com".to_string()),
        });

        Ok(Self {
            llm,
            guardrail_model,
            max_steps: parse_env("AGENT_MAX_STEPS", DEFAULT_MAX_STEPS)?,
            mcp,
            email,
            search,
            prompt_path: env::var("AGENT_PROMPT_PATH").ok().map(PathBuf::from),
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| {
        ConfigError::MissingEnv {
            name: name.to_string(),
        }
        .into()
    })
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| {
            ConfigError::InvalidValue {
                name: name.to_string(),
                value: raw,
            }
            .into()
        }),
        Err(_) => Ok(default),
    }
}

fn csv_env(name: &str, default: &[&str]) -> Vec<String> {
    match env::var(name) {
        Ok(raw) => raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

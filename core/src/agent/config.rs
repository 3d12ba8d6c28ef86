//! Agent configuration

use crate::llm::ChatOptions;

/// Default iteration bound for the model/tool loop
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Response substituted when the loop exhausts its iteration bound
pub const GIVE_UP_RESPONSE: &str =
    "I was unable to finish processing that request. Please try again.";

/// Configuration for an agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// System prompt establishing persona and scope
    pub system_prompt: String,

    /// Maximum model invocations per turn
    pub max_steps: usize,

    /// Sampling options passed through to the model
    pub chat_options: ChatOptions,
}

impl AgentConfig {
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_steps: DEFAULT_MAX_STEPS,
            chat_options: ChatOptions::default(),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_chat_options(mut self, options: ChatOptions) -> Self {
        self.chat_options = options;
        self
    }
}

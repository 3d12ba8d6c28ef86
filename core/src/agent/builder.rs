//! Explicit agent composition
//!
//! Every collaborator is handed in by the caller; the builder never reaches
//! into the environment or constructs clients on its own.

use std::sync::Arc;

use crate::agent::config::AgentConfig;
use crate::agent::core::AgentCore;
use crate::error::{AgentError, Result};
use crate::guardrails::{InputGuardrail, OutputGuardrail};
use crate::llm::LlmClient;
use crate::tools::ToolExecutor;

/// Builder for [`AgentCore`]
#[derive(Default)]
pub struct AgentBuilder {
    config: Option<AgentConfig>,
    llm_client: Option<Arc<dyn LlmClient>>,
    tools: Option<ToolExecutor>,
    input_guardrail: Option<InputGuardrail>,
    output_guardrail: Option<OutputGuardrail>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn llm_client(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    pub fn tools(mut self, tools: ToolExecutor) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn input_guardrail(mut self, guardrail: InputGuardrail) -> Self {
        self.input_guardrail = Some(guardrail);
        self
    }

    pub fn output_guardrail(mut self, guardrail: OutputGuardrail) -> Self {
        self.output_guardrail = Some(guardrail);
        self
    }

    /// Assemble the agent, failing when a required collaborator is missing
    pub fn build(self) -> Result<AgentCore> {
        let config = self.config.ok_or(AgentError::NotInitialized)?;
        let llm_client = self.llm_client.ok_or(AgentError::NotInitialized)?;
        let input_guardrail = self.input_guardrail.ok_or(AgentError::NotInitialized)?;
        let output_guardrail = self.output_guardrail.ok_or(AgentError::NotInitialized)?;
        let tools = self.tools.unwrap_or_default();

        Ok(AgentCore::new(
            config,
            llm_client,
            tools,
            input_guardrail,
            output_guardrail,
        ))
    }
}

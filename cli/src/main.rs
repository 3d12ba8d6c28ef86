//! Robodesk: a guardrailed support assistant for an industrial robotics
//! product line.
//!
//! Configuration is taken entirely from environment variables; there are no
//! command-line flags. The binary wires up the tool catalog, the guardrail
//! stages, and the agent core, then runs a single example turn.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use robodesk_core::config::Settings;
use robodesk_core::guardrails::{InputGuardrail, ModelClassifier, OutputGuardrail};
use robodesk_core::llm::OpenAiCompatClient;
use robodesk_core::prompts;
use robodesk_core::tools::builtin::{SendEmailTool, WebSearchTool};
use robodesk_core::tools::{ToolCatalog, ToolExecutor};
use robodesk_core::{AgentBuilder, AgentConfig, AgentCore, TurnDisposition};

const EXAMPLE_INPUT: &str = "What is the maximum payload of the Motoman MH24?";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    robodesk_core::init_tracing();

    let settings = Settings::from_env().context("failed to resolve settings")?;
    let agent = build_agent(&settings).await?;

    info!(
        model = %settings.llm.model,
        tools = ?agent.tool_names(),
        "robodesk ready"
    );

    let turn = agent.run_turn(EXAMPLE_INPUT).await?;

    info!(
        disposition = ?turn.disposition,
        steps = turn.steps_executed,
        duration_ms = turn.duration_ms,
        "turn complete"
    );
    if turn.disposition != TurnDisposition::Answered {
        warn!(disposition = ?turn.disposition, "reply was substituted");
    }

    println!("{}", turn.reply);
    Ok(())
}

async fn build_agent(settings: &Settings) -> anyhow::Result<AgentCore> {
    let system_prompt = match &settings.prompt_path {
        Some(path) => prompts::load_prompt_file(path)
            .with_context(|| format!("failed to read prompt file {}", path.display()))?,
        None => prompts::get_prompt("robotics_assistant")?.to_string(),
    };

    let llm_client = Arc::new(OpenAiCompatClient::new(&settings.llm)?);
    let guardrail_client: Arc<OpenAiCompatClient> = Arc::new(OpenAiCompatClient::with_model(
        &settings.llm,
        &settings.guardrail_model,
    )?);

    let input_guardrail = InputGuardrail::new(Arc::new(ModelClassifier::for_input(
        guardrail_client.clone(),
    )));
    let output_guardrail = OutputGuardrail::new(Arc::new(ModelClassifier::for_output(
        guardrail_client,
    )));

    let tools = resolve_tools(settings).await;

    let config = AgentConfig::new(system_prompt).with_max_steps(settings.max_steps);
    let agent = AgentBuilder::new()
        .config(config)
        .llm_client(llm_client)
        .tools(tools)
        .input_guardrail(input_guardrail)
        .output_guardrail(output_guardrail)
        .build()?;
    Ok(agent)
}

/// Resolve the requested tool set, degrading when the registry is down
async fn resolve_tools(settings: &Settings) -> ToolExecutor {
    let mut requested = settings.mcp.selected_tools.clone();
    if settings.email.is_some() {
        requested.push("send_email".to_string());
    }
    if settings.search.is_some() {
        requested.push("web_search".to_string());
    }

    match catalog(settings, true) {
        Ok(catalog) => match catalog.resolve(&requested).await {
            Ok(executor) => return executor,
            Err(e) => warn!(error = %e, "tool registry unavailable, using built-ins only"),
        },
        Err(e) => warn!(error = %e, "could not reach tool registry, using built-ins only"),
    }

    match catalog(settings, false) {
        Ok(fallback) => fallback.resolve(&requested).await.unwrap_or_default(),
        Err(_) => ToolExecutor::default(),
    }
}

fn catalog(settings: &Settings, with_registry: bool) -> robodesk_core::error::Result<ToolCatalog> {
    let mut catalog = ToolCatalog::new();
    if with_registry {
        catalog = catalog.with_registry(&settings.mcp)?;
    }
    if let Some(email) = &settings.email {
        catalog.register_local(Box::new(SendEmailTool::new(email.clone())));
    }
    if let Some(search) = &settings.search {
        catalog.register_local(Box::new(WebSearchTool::new(search.clone())));
    }
    Ok(catalog)
}

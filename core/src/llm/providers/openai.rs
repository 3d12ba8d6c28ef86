//! OpenAI-compatible chat completions client
//!
//! Talks the OpenAI wire format directly over `reqwest`, which also covers
//! the many proxies and gateways that speak the same protocol. Used for the
//! primary conversational model and, with a smaller model name, for the
//! secondary safety-classifier model.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ResolvedLlmConfig;
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, ContentBlock, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageContent,
    MessageRole, ToolDefinition, Usage,
};

/// OpenAI-compatible client
pub struct OpenAiCompatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    config: ResolvedLlmConfig,
}

impl OpenAiCompatClient {
    /// Create a new client from a resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key configured for the model provider".to_string(),
            }
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            config: config.clone(),
        })
    }

    /// Create a client for a different model on the same provider endpoint
    pub fn with_model(config: &ResolvedLlmConfig, model: &str) -> Result<Self> {
        let mut config = config.clone();
        config.model = model.to_string();
        Self::new(&config)
    }

    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<ChatRequest> {
        let options = options.unwrap_or_default();
        let mut wire_messages = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System | MessageRole::User => {
                    wire_messages.push(WireMessage {
                        role: role_str(message.role),
                        content: message.text(),
                        tool_calls: None,
                        tool_call_id: None,
                    });
                }
                MessageRole::Assistant => {
                    let (content, tool_calls) = split_assistant_content(&message.content);
                    wire_messages.push(WireMessage {
                        role: "assistant",
                        content,
                        tool_calls: if tool_calls.is_empty() {
                            None
                        } else {
                            Some(tool_calls)
                        },
                        tool_call_id: None,
                    });
                }
                MessageRole::Tool => {
                    // One wire message per tool result block
                    let mut pushed_any = false;
                    if let MessageContent::Blocks(blocks) = &message.content {
                        for block in blocks {
                            if let ContentBlock::ToolResult {
                                tool_use_id,
                                content,
                                ..
                            } = block
                            {
                                wire_messages.push(WireMessage {
                                    role: "tool",
                                    content: Some(content.clone()),
                                    tool_calls: None,
                                    tool_call_id: Some(tool_use_id.clone()),
                                });
                                pushed_any = true;
                            }
                        }
                    }
                    if !pushed_any {
                        return Err(LlmError::InvalidRequest {
                            message: "Tool message must contain a tool result".to_string(),
                        }
                        .into());
                    }
                }
            }
        }

        let max_tokens = options.max_tokens.or(self.config.params.max_tokens);
        let temperature = options.temperature.or(self.config.params.temperature);
        let top_p = options.top_p.or(self.config.params.top_p);

        Ok(ChatRequest {
            model: self.model.clone(),
            messages: wire_messages,
            tools,
            max_tokens,
            temperature,
            top_p,
            stop: options.stop,
        })
    }

    fn convert_response(&self, response: ChatResponse) -> Result<LlmResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidRequest {
                message: "No choices in response".to_string(),
            })?;

        let mut blocks = Vec::new();
        if let Some(text) = &choice.message.content {
            if !text.is_empty() {
                blocks.push(ContentBlock::Text { text: text.clone() });
            }
        }
        if let Some(tool_calls) = &choice.message.tool_calls {
            for call in tool_calls {
                let input: serde_json::Value = serde_json::from_str(&call.function.arguments)
                    .unwrap_or_else(|_| serde_json::Value::String(call.function.arguments.clone()));
                blocks.push(ContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.function.name.clone(),
                    input,
                });
            }
        }

        let content = match (blocks.len(), choice.message.content) {
            (0, _) => MessageContent::Text(String::new()),
            (1, Some(text)) if !text.is_empty() => MessageContent::Text(text),
            _ => MessageContent::Blocks(blocks),
        };

        let finish_reason = choice.finish_reason.map(|reason| match reason.as_str() {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool_calls" => FinishReason::ToolCalls,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        });

        Ok(LlmResponse {
            message: LlmMessage {
                role: MessageRole::Assistant,
                content,
            },
            usage: response.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            model: response.model,
            finish_reason,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        if let Some(tools) = &tools {
            tracing::debug!(tool_count = tools.len(), model = %self.model, "chat request with tools");
        }

        let request = self.build_request(messages, tools, options)?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            }
            .into());
        }

        let chat_response: ChatResponse =
            response.json().await.map_err(|e| LlmError::Network {
                message: format!("Failed to parse response: {}", e),
            })?;

        self.convert_response(chat_response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai_compat"
    }
}

fn role_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
    }
}

fn split_assistant_content(content: &MessageContent) -> (Option<String>, Vec<WireToolCall>) {
    match content {
        MessageContent::Text(text) => (Some(text.clone()), Vec::new()),
        MessageContent::Blocks(blocks) => {
            let mut text = String::new();
            let mut tool_calls = Vec::new();
            for block in blocks {
                match block {
                    ContentBlock::Text { text: t } => {
                        if !text.is_empty() {
                            text.push('\n');
                        }
                        text.push_str(t);
                    }
                    ContentBlock::ToolUse { id, name, input } => {
                        tool_calls.push(WireToolCall {
                            id: id.clone(),
                            call_type: "function".to_string(),
                            function: WireFunctionCall {
                                name: name.clone(),
                                arguments: input.to_string(),
                            },
                        });
                    }
                    ContentBlock::ToolResult { .. } => {}
                }
            }
            let text = if text.is_empty() { None } else { Some(text) };
            (text, tool_calls)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

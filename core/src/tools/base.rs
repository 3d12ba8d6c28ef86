//! Base tool traits and structures

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Result, ToolError};

/// Trait for all tools
///
/// A resolved tool is immutable: name, description, and parameter schema are
/// fixed once the descriptor exists. Implementations must be `Send + Sync`
/// so a shared executor can serve concurrent turns.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters
    async fn execute(&self, call: ToolCall) -> Result<ToolResult>;
}

/// A call to a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Parameters to pass to the tool
    pub parameters: serde_json::Value,
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is a result for
    pub tool_call_id: String,

    /// Whether the execution was successful
    pub success: bool,

    /// Result content
    pub content: String,

    /// Execution duration in milliseconds
    pub duration_ms: Option<u64>,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new<S: Into<String>>(name: S, parameters: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parameters,
        }
    }

    /// Get a parameter value by key
    pub fn get_parameter<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .parameters
            .get(key)
            .ok_or_else(|| ToolError::InvalidParameters {
                message: format!("Missing parameter: {}", key),
            })?;

        serde_json::from_value(value.clone()).map_err(|_| {
            ToolError::InvalidParameters {
                message: format!("Invalid parameter type for: {}", key),
            }
            .into()
        })
    }

    /// Get a parameter value by key with a default
    pub fn get_parameter_or<T>(&self, key: &str, default: T) -> T
    where
        T: for<'de> Deserialize<'de>,
    {
        self.get_parameter(key).unwrap_or(default)
    }
}

impl ToolResult {
    /// Create a successful result
    pub fn success<S: Into<String>>(tool_call_id: S, content: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: true,
            content: content.into(),
            duration_ms: None,
        }
    }

    /// Create an error result
    pub fn error<S: Into<String>>(tool_call_id: S, error: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            success: false,
            content: format!("Error: {}", error.into()),
            duration_ms: None,
        }
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Tool executor that manages tool execution for the agent loop
///
/// Failures degrade rather than abort: an unknown tool name or a failing
/// invocation becomes an error result the model can read, never a crashed
/// turn.
#[derive(Default)]
pub struct ToolExecutor {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolExecutor {
    /// Create a new tool executor
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// List all available tool names
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a single tool call
    pub async fn execute(&self, call: ToolCall) -> ToolResult {
        let Some(tool) = self.get_tool(&call.name) else {
            tracing::warn!(tool = %call.name, "tool call for unregistered tool");
            let error = ToolError::NotFound {
                name: call.name.clone(),
            };
            return ToolResult::error(call.id.clone(), error.to_string());
        };

        let start_time = std::time::Instant::now();
        let call_id = call.id.clone();
        let result = tool.execute(call).await;
        let duration = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(mut result) => {
                result.duration_ms = Some(duration);
                result
            }
            Err(e) => ToolResult::error(call_id, e.to_string()).with_duration(duration),
        }
    }

    /// Execute several tool calls concurrently
    ///
    /// Results come back in the order the calls were issued so the model's
    /// view of the conversation stays deterministic.
    pub async fn execute_batch(&self, calls: Vec<ToolCall>) -> Vec<ToolResult> {
        join_all(calls.into_iter().map(|call| self.execute(call))).await
    }

    /// Get tool definitions for LLM function calling
    pub fn get_tool_definitions(&self) -> Vec<crate::llm::ToolDefinition> {
        let mut definitions: Vec<_> = self
            .tools
            .values()
            .map(|tool| crate::llm::ToolDefinition {
                tool_type: "function".to_string(),
                function: crate::llm::FunctionDefinition {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters_schema(),
                },
            })
            .collect();
        definitions.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its input"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
            let text: String = call.get_parameter("text")?;
            Ok(ToolResult::success(call.id, text))
        }
    }

    struct AlwaysFailsTool;

    #[async_trait]
    impl Tool for AlwaysFailsTool {
        fn name(&self) -> &str {
            "always_fails"
        }

        fn description(&self) -> &str {
            "Fails on every invocation"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
            let _ = call;
            Err(ToolError::ExecutionFailed {
                name: "always_fails".to_string(),
                message: "deliberate failure".to_string(),
            }
            .into())
        }
    }

    fn executor() -> ToolExecutor {
        let mut executor = ToolExecutor::new();
        executor.register_tool(Box::new(EchoTool));
        executor.register_tool(Box::new(AlwaysFailsTool));
        executor
    }

    #[tokio::test]
    async fn unknown_tool_degrades_to_error_result() {
        let executor = executor();
        let result = executor
            .execute(ToolCall::new("does_not_exist", json!({})))
            .await;
        assert!(!result.success);
        assert!(result.content.contains("Tool not found: does_not_exist"));
    }

    #[tokio::test]
    async fn failing_tool_degrades_to_error_result() {
        let executor = executor();
        let result = executor
            .execute(ToolCall::new("always_fails", json!({})))
            .await;
        assert!(!result.success);
        assert!(result.content.contains("deliberate failure"));
    }

    #[tokio::test]
    async fn batch_results_preserve_issue_order() {
        let executor = executor();
        let calls = vec![
            ToolCall::new("echo", json!({"text": "first"})),
            ToolCall::new("always_fails", json!({})),
            ToolCall::new("echo", json!({"text": "third"})),
        ];
        let ids: Vec<String> = calls.iter().map(|c| c.id.clone()).collect();
        let results = executor.execute_batch(calls).await;
        assert_eq!(results.len(), 3);
        for (result, id) in results.iter().zip(&ids) {
            assert_eq!(&result.tool_call_id, id);
        }
        assert_eq!(results[0].content, "first");
        assert!(!results[1].success);
        assert_eq!(results[2].content, "third");
    }

    #[test]
    fn definitions_cover_registered_tools() {
        let executor = executor();
        let defs = executor.get_tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.function.name.as_str()).collect();
        assert_eq!(names, vec!["always_fails", "echo"]);
        assert!(defs.iter().all(|d| d.tool_type == "function"));
    }
}

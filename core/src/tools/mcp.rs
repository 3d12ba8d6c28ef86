//! MCP (Model Context Protocol) registry client over streamable HTTP
//!
//! The registry is a remote MCP server reached with JSON-RPC 2.0 over HTTP
//! POST. Responses arrive either as plain JSON or as a short SSE stream;
//! both carry exactly one JSON-RPC message for the request id we sent.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::time::{timeout, Duration};

use crate::config::McpSettings;
use crate::error::{Result, ToolError};
use crate::tools::{Tool, ToolCall, ToolResult};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Descriptor of a tool exposed by the remote registry
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema", default = "default_schema")]
    pub input_schema: Value,
}

fn default_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// Client for a single remote MCP server
pub struct McpClient {
    http: reqwest::Client,
    url: String,
    server_name: String,
    timeout_secs: u64,
    request_id: AtomicU64,
    session: OnceCell<Option<String>>,
}

impl McpClient {
    /// Create a client from registry settings
    pub fn new(settings: &McpSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ToolError::RegistryUnreachable {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            url: settings.url.clone(),
            server_name: settings.name.clone(),
            timeout_secs: settings.timeout_secs,
            request_id: AtomicU64::new(1),
            session: OnceCell::new(),
        })
    }

    /// Name of the remote server this client targets
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Perform the initialize handshake once, caching the session id
    async fn session_id(&self) -> Result<&Option<String>> {
        self.session
            .get_or_try_init(|| async {
                let request = json!({
                    "jsonrpc": "2.0",
                    "id": self.next_request_id(),
                    "method": "initialize",
                    "params": {
                        "protocolVersion": PROTOCOL_VERSION,
                        "capabilities": { "tools": {} },
                        "clientInfo": {
                            "name": "robodesk",
                            "version": crate::VERSION,
                        }
                    }
                });

                let response = self.post(&request, None).await?;
                let session = response
                    .headers()
                    .get(SESSION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                let body = read_rpc_body(response).await?;
                rpc_result(&body)?;

                // The server expects the initialized notification before
                // serving any other request on this session.
                let note = json!({
                    "jsonrpc": "2.0",
                    "method": "notifications/initialized",
                });
                let response = self.post(&note, session.as_deref()).await?;
                let _ = response.bytes().await;

                tracing::debug!(
                    server = %self.server_name,
                    has_session = session.is_some(),
                    "MCP handshake complete"
                );
                Ok(session)
            })
            .await
    }

    async fn post(
        &self,
        payload: &Value,
        session: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self
            .http
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json, text/event-stream")
            .json(payload);

        if let Some(session) = session {
            request = request.header(SESSION_HEADER, session);
        }

        let response = timeout(Duration::from_secs(self.timeout_secs), request.send())
            .await?
            .map_err(|e| ToolError::RegistryUnreachable {
                message: format!("{}: {}", self.url, e),
            })?;

        if !response.status().is_success() && response.status().as_u16() != 202 {
            return Err(ToolError::RegistryUnreachable {
                message: format!("{} returned HTTP {}", self.url, response.status()),
            }
            .into());
        }

        Ok(response)
    }

    /// Send a JSON-RPC request and return its `result` object
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let session = self.session_id().await?.clone();

        let mut request = json!({
            "jsonrpc": "2.0",
            "id": self.next_request_id(),
            "method": method,
        });
        if let Some(params) = params {
            request["params"] = params;
        }

        let response = self.post(&request, session.as_deref()).await?;
        let body = read_rpc_body(response).await?;
        rpc_result(&body)
    }

    /// List the tools exposed by the remote server
    pub async fn list_tools(&self) -> Result<Vec<RemoteToolDescriptor>> {
        let result = self.call("tools/list", None).await?;
        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let descriptors = tools
            .into_iter()
            .filter_map(|t| serde_json::from_value(t).ok())
            .collect();
        Ok(descriptors)
    }

    /// Call a tool on the remote server and flatten its content to text
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<String> {
        let result = self
            .call(
                "tools/call",
                Some(json!({ "name": name, "arguments": arguments })),
            )
            .await?;

        let text = flatten_content(&result);
        if result.get("isError").and_then(Value::as_bool).unwrap_or(false) {
            return Err(ToolError::ExecutionFailed {
                name: name.to_string(),
                message: text,
            }
            .into());
        }
        Ok(text)
    }
}

/// Read the single JSON-RPC message out of a plain-JSON or SSE response
async fn read_rpc_body(response: reqwest::Response) -> Result<Value> {
    let content_type = response
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = response.text().await?;
    parse_rpc_body(&content_type, &body)
}

fn parse_rpc_body(content_type: &str, body: &str) -> Result<Value> {
    if content_type.contains("text/event-stream") {
        for line in body.lines() {
            let line = line.trim();
            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if data.is_empty() || data == "[DONE]" {
                    continue;
                }
                let value: Value = serde_json::from_str(data)?;
                // Skip interleaved notifications; we want the response.
                if value.get("id").is_some() {
                    return Ok(value);
                }
            }
        }
        return Err(ToolError::RegistryUnreachable {
            message: "event stream ended without a response message".to_string(),
        }
        .into());
    }

    Ok(serde_json::from_str(body)?)
}

/// Extract the `result` object, mapping JSON-RPC errors
fn rpc_result(message: &Value) -> Result<Value> {
    if let Some(error) = message.get("error") {
        let text = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(ToolError::RegistryUnreachable {
            message: format!("JSON-RPC error: {}", text),
        }
        .into());
    }

    message
        .get("result")
        .cloned()
        .ok_or_else(|| {
            ToolError::RegistryUnreachable {
                message: "response carried neither result nor error".to_string(),
            }
            .into()
        })
}

/// Join the text blocks of a tools/call result
fn flatten_content(result: &Value) -> String {
    let Some(content) = result.get("content").and_then(Value::as_array) else {
        return serde_json::to_string(result).unwrap_or_default();
    };

    let texts: Vec<&str> = content
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();
    texts.join("\n")
}

/// A remote registry tool surfaced through the local [`Tool`] trait
pub struct RemoteTool {
    descriptor: RemoteToolDescriptor,
    client: Arc<McpClient>,
}

impl RemoteTool {
    pub fn new(descriptor: RemoteToolDescriptor, client: Arc<McpClient>) -> Self {
        Self { descriptor, client }
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        &self.descriptor.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.descriptor.input_schema.clone()
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let content = self
            .client
            .call_tool(&self.descriptor.name, call.parameters.clone())
            .await?;
        Ok(ToolResult::success(call.id, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_body_parses() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#;
        let value = parse_rpc_body("application/json", body).unwrap();
        assert!(value.get("result").is_some());
    }

    #[test]
    fn sse_body_yields_the_response_message() {
        let body = concat!(
            "event: message\n",
            "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n",
            "\n",
            "data: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"ok\":true}}\n",
            "\n",
        );
        let value = parse_rpc_body("text/event-stream; charset=utf-8", body).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["result"]["ok"], true);
    }

    #[test]
    fn sse_body_without_response_is_an_error() {
        let body = "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n\n";
        assert!(parse_rpc_body("text/event-stream", body).is_err());
    }

    #[test]
    fn rpc_error_is_surfaced() {
        let message = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": { "code": -32601, "message": "Method not found" }
        });
        let err = rpc_result(&message).unwrap_err();
        assert!(err.to_string().contains("Method not found"));
    }

    #[test]
    fn tool_content_flattens_text_blocks() {
        let result = json!({
            "content": [
                { "type": "text", "text": "first" },
                { "type": "image", "data": "..." },
                { "type": "text", "text": "second" },
            ]
        });
        assert_eq!(flatten_content(&result), "first\nsecond");
    }

    #[test]
    fn descriptor_defaults_missing_schema() {
        let descriptor: RemoteToolDescriptor =
            serde_json::from_value(json!({ "name": "retrieve_documents" })).unwrap();
        assert_eq!(descriptor.name, "retrieve_documents");
        assert_eq!(descriptor.input_schema["type"], "object");
    }
}

//! Tool catalog that resolves requested tool names against what exists

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::McpSettings;
use crate::error::Result;
use crate::tools::base::{Tool, ToolExecutor};
use crate::tools::mcp::{McpClient, RemoteTool};

/// Resolves a requested set of tool names against the remote registry and
/// locally registered tools, then builds the executor the agent runs with.
///
/// Names that match nothing are omitted with a warning rather than failing
/// the whole setup. The assistant simply runs without those tools.
pub struct ToolCatalog {
    remote: Option<Arc<McpClient>>,
    local: HashMap<String, Box<dyn Tool>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            remote: None,
            local: HashMap::new(),
        }
    }

    /// Attach a remote MCP registry
    pub fn with_registry(mut self, settings: &McpSettings) -> Result<Self> {
        self.remote = Some(Arc::new(McpClient::new(settings)?));
        Ok(self)
    }

    /// Register a locally implemented tool
    pub fn register_local(&mut self, tool: Box<dyn Tool>) {
        self.local.insert(tool.name().to_string(), tool);
    }

    /// Resolve the requested names into a ready executor
    ///
    /// Remote names shadow local ones when both exist, matching how the
    /// registry is treated as the source of truth for shared tools.
    pub async fn resolve(mut self, requested: &[String]) -> Result<ToolExecutor> {
        let mut remote_tools: HashMap<String, RemoteTool> = HashMap::new();

        if let Some(client) = &self.remote {
            let descriptors = client.list_tools().await?;
            tracing::debug!(
                server = %client.server_name(),
                count = descriptors.len(),
                "fetched remote tool descriptors"
            );
            for descriptor in descriptors {
                remote_tools.insert(
                    descriptor.name.clone(),
                    RemoteTool::new(descriptor, Arc::clone(client)),
                );
            }
        }

        let mut executor = ToolExecutor::new();
        let mut missing = Vec::new();

        for name in requested {
            if let Some(tool) = remote_tools.remove(name) {
                executor.register_tool(Box::new(tool));
            } else if let Some(tool) = self.local.remove(name) {
                executor.register_tool(tool);
            } else {
                missing.push(name.as_str());
            }
        }

        if !missing.is_empty() {
            let mut available: Vec<&str> = remote_tools
                .keys()
                .chain(self.local.keys())
                .map(String::as_str)
                .collect();
            available.sort_unstable();
            tracing::warn!(
                missing = ?missing,
                available = ?available,
                "requested tools not found, continuing without them"
            );
        }

        Ok(executor)
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}

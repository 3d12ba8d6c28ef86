//! Tool abstractions, the remote registry client, and built-in tools

pub mod base;
pub mod builtin;
pub mod catalog;
pub mod mcp;

pub use base::{Tool, ToolCall, ToolExecutor, ToolResult};
pub use catalog::ToolCatalog;
pub use mcp::{McpClient, RemoteTool};

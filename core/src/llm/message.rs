//! Conversation message structures
//!
//! A turn's conversation is an ordered `Vec<LlmMessage>`, append-only while
//! the turn executes and owned exclusively by the agent core.

use serde::{Deserialize, Serialize};

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    /// Role of the message sender
    pub role: MessageRole,

    /// Content of the message
    pub content: MessageContent,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System message (instructions)
    System,

    /// User message (human input)
    User,

    /// Assistant message (model response)
    Assistant,

    /// Tool message (tool execution result)
    Tool,
}

/// Content of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),

    /// Structured content blocks (text interleaved with tool activity)
    Blocks(Vec<ContentBlock>),
}

/// A block of content within a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },

    /// Tool use request emitted by the model
    ToolUse {
        /// Unique identifier for this tool use
        id: String,
        /// Name of the tool to invoke
        name: String,
        /// Input parameters for the tool
        input: serde_json::Value,
    },

    /// Result of a tool invocation
    ToolResult {
        /// ID of the tool use this is a result for
        tool_use_id: String,
        /// Whether the tool execution failed
        is_error: Option<bool>,
        /// Result content
        content: String,
    },
}

impl LlmMessage {
    /// Create a new system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a new user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a new assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a tool message carrying a single tool result
    pub fn tool_result<S: Into<String>>(tool_use_id: S, is_error: bool, content: S) -> Self {
        Self {
            role: MessageRole::Tool,
            content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                is_error: Some(is_error),
                content: content.into(),
            }]),
        }
    }

    /// Get the joined text content of the message
    pub fn text(&self) -> Option<String> {
        match &self.content {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::Blocks(blocks) => {
                let parts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|block| match block {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("\n"))
                }
            }
        }
    }

    /// Text of the final block, for stages that only screen the newest
    /// fragment of a block-structured message.
    pub fn final_block_text(&self) -> Option<String> {
        match &self.content {
            MessageContent::Text(text) => Some(text.clone()),
            MessageContent::Blocks(blocks) => blocks.iter().rev().find_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            }),
        }
    }

    /// Check if the message contains a tool use request
    pub fn has_tool_use(&self) -> bool {
        match &self.content {
            MessageContent::Text(_) => false,
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .any(|block| matches!(block, ContentBlock::ToolUse { .. })),
        }
    }

    /// Extract tool use blocks from the message, in emission order
    pub fn tool_uses(&self) -> Vec<&ContentBlock> {
        match &self.content {
            MessageContent::Text(_) => Vec::new(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter(|block| matches!(block, ContentBlock::ToolUse { .. }))
                .collect(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn final_block_text_skips_tool_blocks() {
        let msg = LlmMessage {
            role: MessageRole::User,
            content: MessageContent::Blocks(vec![
                ContentBlock::Text {
                    text: "earlier".to_string(),
                },
                ContentBlock::ToolUse {
                    id: "t1".to_string(),
                    name: "retrieve_documents".to_string(),
                    input: json!({"query": "MH24"}),
                },
                ContentBlock::Text {
                    text: "latest".to_string(),
                },
            ]),
        };
        assert_eq!(msg.final_block_text().as_deref(), Some("latest"));
    }

    #[test]
    fn tool_uses_preserve_emission_order() {
        let msg = LlmMessage {
            role: MessageRole::Assistant,
            content: MessageContent::Blocks(vec![
                ContentBlock::ToolUse {
                    id: "a".to_string(),
                    name: "retrieve_documents".to_string(),
                    input: json!({}),
                },
                ContentBlock::ToolUse {
                    id: "b".to_string(),
                    name: "web_search".to_string(),
                    input: json!({}),
                },
            ]),
        };
        let ids: Vec<&str> = msg
            .tool_uses()
            .iter()
            .map(|block| match block {
                ContentBlock::ToolUse { id, .. } => id.as_str(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn plain_text_message_has_no_tool_use() {
        let msg = LlmMessage::assistant("The DX200 controller supports up to 8 axes.");
        assert!(!msg.has_tool_use());
        assert_eq!(
            msg.text().as_deref(),
            Some("The DX200 controller supports up to 8 axes.")
        );
    }
}

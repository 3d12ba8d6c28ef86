//! System prompts and the prompt registry
//!
//! The system prompt is supplied either from the built-in registry or read
//! wholesale from a plain-text file at startup. A file read failure is fatal;
//! there is no fallback prompt for a misconfigured deployment.

use std::path::Path;

use crate::error::{ConfigError, Result};

/// Support assistant for the robotics product line
pub const ROBOTICS_ASSISTANT_PROMPT: &str = "\
You are a support assistant for the Yaskawa Motoman industrial robot product line.

You have access to the following capabilities:
- Retrieve product documentation and specifications using the retrieval tool
- Send emails with proper formatting when explicitly asked
- Search the web, restricted to approved manufacturer domains

Guidelines:
- Always search the documentation before answering technical questions
- Cite the retrieved source when providing specifications
- Stay within the robotics product domain; politely decline anything else
- Be professional and concise in your responses";

/// Generic retrieval-augmented assistant
pub const RAG_ASSISTANT_PROMPT: &str = "\
You are a helpful assistant with access to a document retrieval system.

You can:
- Search through documents to find relevant information
- Answer questions based on retrieved content
- Provide citations and references when possible

Guidelines:
- Always search for information before answering questions
- Cite your sources when providing information
- If you can't find relevant information, say so clearly";

const PROMPT_REGISTRY: &[(&str, &str)] = &[
    ("robotics_assistant", ROBOTICS_ASSISTANT_PROMPT),
    ("rag_assistant", RAG_ASSISTANT_PROMPT),
];

/// Look up a built-in prompt by name
pub fn get_prompt(name: &str) -> Result<&'static str> {
    PROMPT_REGISTRY
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, prompt)| *prompt)
        .ok_or_else(|| {
            ConfigError::UnknownPrompt {
                name: name.to_string(),
                available: PROMPT_REGISTRY
                    .iter()
                    .map(|(key, _)| *key)
                    .collect::<Vec<_>>()
                    .join(", "),
            }
            .into()
        })
}

/// Read a system prompt from a plain-text file
pub fn load_prompt_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|_| {
        ConfigError::PromptFileNotFound {
            path: path.display().to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_succeeds_for_known_names() {
        assert!(get_prompt("robotics_assistant").is_ok());
        assert!(get_prompt("rag_assistant").is_ok());
    }

    #[test]
    fn unknown_prompt_lists_available_names() {
        let err = get_prompt("email_wizard").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("email_wizard"));
        assert!(text.contains("robotics_assistant"));
    }

    #[test]
    fn missing_prompt_file_is_an_error() {
        let err = load_prompt_file(Path::new("/nonexistent/prompt.md")).unwrap_err();
        assert!(err.to_string().contains("Prompt file not found"));
    }
}

//! Web search tool backed by a Tavily-compatible HTTP API
//!
//! Searches are restricted to an allow-list of manufacturer domains so the
//! assistant cites vendor documentation rather than arbitrary pages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::SearchSettings;
use crate::error::{Result, ToolError};
use crate::tools::base::{Tool, ToolCall, ToolResult};

const MAX_RESULTS: u32 = 5;

/// Tool that answers questions from allow-listed web sources
pub struct WebSearchTool {
    client: reqwest::Client,
    settings: SearchSettings,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    include_domains: &'a [String],
    max_results: u32,
    include_answer: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl WebSearchTool {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    async fn search(&self, query: &str) -> Result<SearchResponse> {
        let request = SearchRequest {
            api_key: &self.settings.api_key,
            query,
            include_domains: &self.settings.allowed_domains,
            max_results: MAX_RESULTS,
            include_answer: true,
        };

        let response = self
            .client
            .post(format!("{}/search", self.settings.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "web_search".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ToolError::ExecutionFailed {
                name: "web_search".to_string(),
                message: format!("provider returned HTTP {}: {}", status, detail),
            }
            .into());
        }

        Ok(response.json().await?)
    }
}

/// Render a response as an answer followed by numbered sources
fn format_results(query: &str, response: &SearchResponse) -> String {
    if response.results.is_empty() && response.answer.is_none() {
        return format!("No results found for: {}", query);
    }

    let mut output = String::new();
    if let Some(answer) = &response.answer {
        output.push_str(answer);
        output.push('\n');
    }

    if !response.results.is_empty() {
        output.push_str("\nSources:\n");
        for (i, hit) in response.results.iter().enumerate() {
            output.push_str(&format!("{}. {} ({})\n", i + 1, hit.title, hit.url));
            if !hit.content.is_empty() {
                output.push_str(&format!("   {}\n", hit.content));
            }
        }
    }

    output.trim_end().to_string()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search manufacturer websites for current product information such as \
         specifications, payload ratings, and documentation. Results are \
         limited to approved robotics vendor domains."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let query: String = call.get_parameter("query")?;
        if query.trim().is_empty() {
            return Ok(ToolResult::error(call.id, "Query cannot be empty".to_string()));
        }

        let response = self.search(&query).await?;
        Ok(ToolResult::success(call.id, format_results(&query, &response)))
    }
}

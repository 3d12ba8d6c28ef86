//! Email sending tool backed by a Resend-compatible HTTP API

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::config::EmailSettings;
use crate::error::{Result, ToolError};
use crate::tools::base::{Tool, ToolCall, ToolResult};

/// Tool that sends an email on the assistant's behalf
pub struct SendEmailTool {
    client: reqwest::Client,
    settings: EmailSettings,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    from: &'a str,
    to: Vec<String>,
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

impl SendEmailTool {
    pub fn new(settings: EmailSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    async fn send(&self, to: &str, subject: &str, body: &str, html: bool) -> Result<String> {
        let request = EmailRequest {
            from: &self.settings.from_address,
            to: vec![to.to_string()],
            subject,
            text: (!html).then_some(body),
            html: html.then_some(body),
        };

        let response = self
            .client
            .post(format!("{}/emails", self.settings.base_url))
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "send_email".to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ToolError::ExecutionFailed {
                name: "send_email".to_string(),
                message: format!("provider returned HTTP {}: {}", status, detail),
            }
            .into());
        }

        let body: serde_json::Value = response.json().await?;
        let id = body
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        Ok(format!("Email sent to {} (id: {})", to, id))
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send an email to a single recipient. Use for follow-ups the user \
         explicitly asks for, such as sending a summary or a quote request."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "to": {
                    "type": "string",
                    "description": "Recipient email address"
                },
                "subject": {
                    "type": "string",
                    "description": "Subject line"
                },
                "body": {
                    "type": "string",
                    "description": "Message body"
                },
                "html": {
                    "type": "boolean",
                    "description": "Treat the body as HTML instead of plain text (default: false)"
                }
            },
            "required": ["to", "subject", "body"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let to: String = call.get_parameter("to")?;
        let subject: String = call.get_parameter("subject")?;
        let body: String = call.get_parameter("body")?;
        let html: bool = call.get_parameter_or("html", false);

        if !to.contains('@') {
            return Ok(ToolResult::error(
                call.id,
                format!("Invalid recipient address: {}", to),
            ));
        }

        let content = self.send(&to, &subject, &body, html).await?;
        Ok(ToolResult::success(call.id, content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> SendEmailTool {
        SendEmailTool::new(EmailSettings {
            api_key: "test-key".to_string(),
            from_address: "assistant@robodesk.example".to_string(),
            base_url: "https://api.resend.example".to_string(),
        })
    }

    #[tokio::test]
    async fn missing_recipient_is_a_parameter_error() {
        let call = ToolCall::new("send_email", json!({"subject": "hi", "body": "text"}));
        let err = tool().execute(call).await.unwrap_err();
        assert!(err.to_string().contains("Missing parameter: to"));
    }

    #[tokio::test]
    async fn malformed_recipient_degrades_to_error_result() {
        let call = ToolCall::new(
            "send_email",
            json!({"to": "not-an-address", "subject": "hi", "body": "text"}),
        );
        let result = tool().execute(call).await.unwrap();
        assert!(!result.success);
        assert!(result.content.contains("Invalid recipient address"));
    }

    #[test]
    fn request_body_switches_between_text_and_html() {
        let plain = EmailRequest {
            from: "a@b.c",
            to: vec!["d@e.f".to_string()],
            subject: "s",
            text: Some("body"),
            html: None,
        };
        let value = serde_json::to_value(&plain).unwrap();
        assert_eq!(value["text"], "body");
        assert!(value.get("html").is_none());

        let rich = EmailRequest {
            from: "a@b.c",
            to: vec!["d@e.f".to_string()],
            subject: "s",
            text: None,
            html: Some("<p>body</p>"),
        };
        let value = serde_json::to_value(&rich).unwrap();
        assert_eq!(value["html"], "<p>body</p>");
        assert!(value.get("text").is_none());
    }
}

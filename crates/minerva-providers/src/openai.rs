// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote chat provider speaking an OpenAI-compatible chat-completions API.
//!
//! Used against an Alibaba DashScope compatible-mode endpoint by default,
//! but any OpenAI-compatible server works. Bearer authentication, one retry
//! on transient status codes (429/500/503), per-call timeout from config.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, warn};

use minerva_config::model::RemoteModelConfig;
use minerva_core::{MinervaError, ProviderKind, Role};

use crate::provider::ChatProvider;
use crate::types::{ChatMessage, ChatReply, ToolCall, ToolDefinition};

/// Chat provider backed by an OpenAI-compatible endpoint.
#[derive(Debug)]
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunctionCall,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// The chat-completions wire format carries arguments as a JSON-encoded
    /// string.
    #[serde(default)]
    arguments: String,
}

impl OpenAiCompatProvider {
    /// Builds the provider from configuration. Fails when no API key is set;
    /// callers should simply not register the remote model in that case.
    pub fn new(config: &RemoteModelConfig) -> Result<Self, MinervaError> {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            MinervaError::Config("remote_model.api_key is required for the remote provider".into())
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                MinervaError::Config(format!("invalid remote_model.api_key: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MinervaError::ProviderRejected {
                message: format!("failed to build remote model HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            max_retries: 1,
        })
    }

    fn wire_messages(messages: &[ChatMessage]) -> Vec<serde_json::Value> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::Assistant if !m.tool_calls.is_empty() => serde_json::json!({
                    "role": "assistant",
                    "content": m.content,
                    "tool_calls": m.tool_calls.iter().map(|c| serde_json::json!({
                        "id": c.id,
                        "type": "function",
                        "function": {
                            "name": c.name,
                            "arguments": c.arguments.to_string(),
                        }
                    })).collect::<Vec<_>>(),
                }),
                Role::Tool => serde_json::json!({
                    "role": "tool",
                    "content": m.content,
                    "tool_call_id": m.tool_call_id,
                }),
                _ => serde_json::json!({
                    "role": m.role.to_string(),
                    "content": m.content,
                }),
            })
            .collect()
    }

    fn wire_tools(tools: &[ToolDefinition]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect()
    }
}

/// Status codes worth one retry.
fn is_transient(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

#[async_trait]
impl ChatProvider for OpenAiCompatProvider {
    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Remote
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatReply, MinervaError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::wire_messages(messages),
        });
        if !tools.is_empty() {
            body["tools"] = serde_json::Value::Array(Self::wire_tools(tools));
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying remote model request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
                if e.is_timeout() {
                    MinervaError::ProviderTimeout {
                        seconds: self.timeout_secs,
                    }
                } else {
                    MinervaError::ProviderRejected {
                        message: format!("remote model request failed: {e}"),
                    }
                }
            })?;

            let status = response.status();
            debug!(status = %status, attempt, "remote model response received");

            if status.is_success() {
                let parsed: CompletionResponse =
                    response.json().await.map_err(|e| MinervaError::ProviderRejected {
                        message: format!("failed to parse remote model response: {e}"),
                    })?;

                let choice = parsed.choices.into_iter().next().ok_or_else(|| {
                    MinervaError::ProviderRejected {
                        message: "remote model returned no choices".into(),
                    }
                })?;

                let tool_calls = choice
                    .message
                    .tool_calls
                    .into_iter()
                    .map(|c| ToolCall {
                        id: c.id,
                        name: c.function.name,
                        // Malformed argument JSON is preserved verbatim so the
                        // agent loop can report the schema violation.
                        arguments: serde_json::from_str(&c.function.arguments)
                            .unwrap_or(serde_json::Value::String(c.function.arguments)),
                    })
                    .collect();

                return Ok(ChatReply {
                    content: choice.message.content.filter(|c| !c.is_empty()),
                    tool_calls,
                });
            }

            if is_transient(status) && attempt < self.max_retries {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, "transient error, will retry");
                last_error = Some(MinervaError::ProviderRejected {
                    message: format!("remote model returned {status}: {body}"),
                });
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(MinervaError::ProviderRejected {
                message: format!("remote model returned {status}: {body}"),
            });
        }

        Err(last_error.unwrap_or_else(|| MinervaError::ProviderRejected {
            message: "remote model request failed after retries".into(),
        }))
    }
}

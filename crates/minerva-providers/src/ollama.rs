// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local chat provider speaking the Ollama chat API.
//!
//! One POST to `{base_url}/api/chat` per model step with `stream: false`.
//! Ollama does not assign tool-call ids, so this provider synthesises them;
//! tool-result messages are serialised back without the id, which the API
//! does not expect.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use minerva_config::model::LocalModelConfig;
use minerva_core::{MinervaError, ProviderKind, Role};

use crate::provider::ChatProvider;
use crate::types::{ChatMessage, ChatReply, ToolCall, ToolDefinition};

/// Chat provider backed by a local Ollama server.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Debug, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

impl OllamaProvider {
    /// Builds the provider from configuration; the per-call timeout is baked
    /// into the HTTP client.
    pub fn new(config: &LocalModelConfig) -> Result<Self, MinervaError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MinervaError::ProviderRejected {
                message: format!("failed to build local model HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
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
                        "function": {"name": c.name, "arguments": c.arguments}
                    })).collect::<Vec<_>>(),
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

#[async_trait]
impl ChatProvider for OllamaProvider {
    fn provider_kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatReply, MinervaError> {
        let url = format!("{}/api/chat", self.base_url);
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::wire_messages(messages),
            "stream": false,
        });
        if !tools.is_empty() {
            body["tools"] = serde_json::Value::Array(Self::wire_tools(tools));
        }

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                MinervaError::ProviderTimeout {
                    seconds: self.timeout_secs,
                }
            } else {
                MinervaError::ProviderRejected {
                    message: format!("local model request failed: {e}"),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MinervaError::ProviderRejected {
                message: format!("local model returned {status}: {body}"),
            });
        }

        let parsed: OllamaChatResponse =
            response.json().await.map_err(|e| MinervaError::ProviderRejected {
                message: format!("failed to parse local model response: {e}"),
            })?;

        let tool_calls: Vec<ToolCall> = parsed
            .message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, c)| ToolCall {
                // Ollama emits no call ids; synthesise stable ones per step.
                id: format!("call_{i}"),
                name: c.function.name,
                arguments: c.function.arguments,
            })
            .collect();

        debug!(
            model = self.model.as_str(),
            tool_calls = tool_calls.len(),
            "local model step complete"
        );

        let content = if parsed.message.content.is_empty() {
            None
        } else {
            Some(parsed.message.content)
        };

        Ok(ChatReply {
            content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(base_url: &str) -> OllamaProvider {
        OllamaProvider::new(&LocalModelConfig {
            base_url: base_url.to_string(),
            model: "qwen2.5:7b".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn chat_returns_final_text() {
        let server = MockServer::start().await;
        let response = serde_json::json!({
            "model": "qwen2.5:7b",
            "message": {"role": "assistant", "content": "你好！"},
            "done": true
        });
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let reply = provider
            .chat(&[ChatMessage::user("你好")], &[])
            .await
            .unwrap();
        assert_eq!(reply.content.as_deref(), Some("你好！"));
        assert!(!reply.wants_tools());
    }

    #[tokio::test]
    async fn chat_parses_tool_calls_and_synthesises_ids() {
        let server = MockServer::start().await;
        let response = serde_json::json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "calculate", "arguments": {"expression": "1+1"}}}
                ]
            },
            "done": true
        });
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response))
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let tools = vec![ToolDefinition {
            name: "calculate".into(),
            description: "math".into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }];
        let reply = provider
            .chat(&[ChatMessage::user("算一下1+1")], &tools)
            .await
            .unwrap();
        assert!(reply.wants_tools());
        assert_eq!(reply.tool_calls[0].id, "call_0");
        assert_eq!(reply.tool_calls[0].name, "calculate");
        assert_eq!(reply.tool_calls[0].arguments["expression"], "1+1");
    }

    #[tokio::test]
    async fn server_error_is_rejected_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = test_provider(&server.uri());
        let err = provider
            .chat(&[ChatMessage::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, MinervaError::ProviderRejected { .. }));
    }

    #[test]
    fn provider_kind_is_local() {
        let provider = OllamaProvider::new(&LocalModelConfig::default()).unwrap();
        assert_eq!(provider.provider_kind(), ProviderKind::Local);
        assert_eq!(provider.model_id(), "qwen2.5:7b");
    }
}

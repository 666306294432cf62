// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat provider for deterministic testing.
//!
//! Replies are popped from a FIFO queue. When the queue is empty, a default
//! text reply is returned, so exhausted scripts never hang a test.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use minerva_core::{MinervaError, ProviderKind};
use minerva_providers::{ChatMessage, ChatProvider, ChatReply, ToolCall, ToolDefinition};

/// A scripted chat provider.
pub struct MockProvider {
    kind: ProviderKind,
    model: String,
    replies: Mutex<VecDeque<ChatReply>>,
    /// When set, every call fails with this error message instead.
    fail_with: Option<String>,
}

impl MockProvider {
    /// A local-tagged provider with the given scripted replies.
    pub fn with_replies(replies: Vec<ChatReply>) -> Self {
        Self {
            kind: ProviderKind::Local,
            model: "mock-model".to_string(),
            replies: Mutex::new(VecDeque::from(replies)),
            fail_with: None,
        }
    }

    /// Convenience: text-only replies.
    pub fn with_text_responses(texts: Vec<&str>) -> Self {
        Self::with_replies(texts.into_iter().map(Self::text).collect())
    }

    /// A provider whose every call fails terminally.
    pub fn failing(message: &str) -> Self {
        Self {
            kind: ProviderKind::Local,
            model: "mock-model".to_string(),
            replies: Mutex::new(VecDeque::new()),
            fail_with: Some(message.to_string()),
        }
    }

    /// Tags this provider as remote.
    pub fn remote(mut self) -> Self {
        self.kind = ProviderKind::Remote;
        self
    }

    /// A plain text reply.
    pub fn text(content: &str) -> ChatReply {
        ChatReply {
            content: Some(content.to_string()),
            tool_calls: vec![],
        }
    }

    /// A reply that invokes one tool.
    pub fn tool_call(name: &str, arguments: serde_json::Value) -> ChatReply {
        ChatReply {
            content: None,
            tool_calls: vec![ToolCall {
                id: format!("call_{name}"),
                name: name.to_string(),
                arguments,
            }],
        }
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn provider_kind(&self) -> ProviderKind {
        self.kind
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn chat(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatReply, MinervaError> {
        if let Some(ref message) = self.fail_with {
            return Err(MinervaError::ProviderRejected {
                message: message.clone(),
            });
        }
        Ok(self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Self::text("mock response")))
    }
}

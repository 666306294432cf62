// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The uniform chat-model contract.

use async_trait::async_trait;

use minerva_core::{MinervaError, ProviderKind};

use crate::types::{ChatMessage, ChatReply, ToolDefinition};

/// Uniform call surface over local and remote chat providers.
///
/// One call is one model step: the reply is either a final assistant text
/// or a set of tool-call requests. The tool-calling loop belongs to the
/// agent, not the provider.
///
/// Provider identity is a tag attached here at registration time; callers
/// must never inspect concrete types to learn where a model lives.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Local or remote.
    fn provider_kind(&self) -> ProviderKind;

    /// Identifier of the model this handle speaks to.
    fn model_id(&self) -> &str;

    /// Runs one model step over the ordered message list with the given
    /// tool set.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatReply, MinervaError>;
}

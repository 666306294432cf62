// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-model providers for the Minerva service.
//!
//! Two providers honour the same [`ChatProvider`] contract: a local one
//! speaking the Ollama chat API and a remote one speaking an
//! OpenAI-compatible chat-completions API. Differences in wire format are
//! a provider concern and stay inside the respective modules.

pub mod ollama;
pub mod openai;
pub mod provider;
pub mod types;

pub use ollama::OllamaProvider;
pub use openai::OpenAiCompatProvider;
pub use provider::ChatProvider;
pub use types::{ChatMessage, ChatReply, ToolCall, ToolDefinition};

// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the Minerva crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Prefix given to conversations created by the agent streaming path.
pub const AGENT_CONVERSATION_PREFIX: &str = "agent-";

/// Prefix given to conversations created by the plain chat path.
pub const CHAT_CONVERSATION_PREFIX: &str = "chat-";

/// Role of a stored or in-flight message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
    System,
}

/// A single persisted message within a conversation.
///
/// Immutable once written. Messages are ordered within a conversation by
/// `created_at` ascending, ties broken by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMessage {
    /// Auto-assigned row id.
    pub id: i64,
    /// Conversation this message belongs to (kind-prefixed).
    pub conversation_id: String,
    /// Session-bound user that produced the message, when known.
    pub user_id: Option<String>,
    /// Role: user, assistant, or tool.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Serialised retrieval sources, assistant messages only.
    pub sources: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// A message not yet persisted (no row id).
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub user_id: Option<String>,
    pub role: Role,
    pub content: String,
    pub sources: Option<String>,
    pub created_at: String,
}

/// A retrieval result: text plus metadata plus similarity score in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSegment {
    /// Chunk text.
    pub text: String,
    /// Source metadata attached at ingestion time.
    pub metadata: SegmentMetadata,
    /// Similarity score, higher is more similar.
    pub score: f64,
}

/// Metadata stored alongside a vector segment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
}

/// Lifecycle status of one tool invocation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolCallStatus {
    Started,
    Completed,
    Failed,
}

/// Observability record of one tool invocation within a turn.
///
/// Defined once at this boundary; provider-specific variants are converted
/// at the edge. Not persisted — surfaced to clients via the `agent-history`
/// SSE event only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    /// 1-based step index within the turn.
    pub step: u32,
    /// Registered tool name.
    pub tool_name: String,
    /// Arguments the model supplied, as JSON.
    pub input: serde_json::Value,
    /// Truncated result preview, absent until the call finishes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Wall-clock duration of the invocation.
    pub duration_ms: u64,
    /// STARTED, then COMPLETED or FAILED.
    pub status: ToolCallStatus,
}

/// Which provider backs a chat-model handle.
///
/// Attached at registration time so callers never inspect concrete types
/// to learn where a model lives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Local,
    Remote,
}

/// Coarse classification of a user message, used by the router.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    ComplexQuery,
    LongContext,
    HighPrecision,
    SimpleQa,
    ToolCalling,
    GeneralChat,
}

/// Outcome of routing one request to a chat model. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingDecision {
    /// Identifier of the selected model.
    pub model_id: String,
    /// Local or remote, from the handle's registration tag.
    pub provider: ProviderKind,
    /// Detected business type, absent under the percentage strategy.
    pub business_type: Option<BusinessType>,
    /// Human-readable explanation, including any fallback substitution.
    pub reason: String,
}

// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider-neutral chat types.
//!
//! Both providers honour the same `chat(messages, tools)` contract; the
//! types here are what crosses that boundary. Wire formats live inside the
//! individual provider modules.

use minerva_core::Role;
use serde::{Deserialize, Serialize};

/// One message in the in-flight conversation presented to a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// user, assistant, tool, or system.
    pub role: Role,
    /// Message text. May be empty on assistant messages that only carry
    /// tool calls.
    pub content: String,
    /// Tool calls issued by an assistant message mid-loop.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool-role messages: id of the call being answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// An assistant message that requests tool invocations.
    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    /// A tool result answering the call with the given id.
    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned (or synthesised) call id, echoed back in the
    /// tool result.
    pub id: String,
    /// Registered tool name.
    pub name: String,
    /// Structured arguments. When the provider emits malformed argument
    /// JSON this holds the raw string so the agent loop can report the
    /// schema violation.
    pub arguments: serde_json::Value,
}

/// A tool made available to the model for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema object describing the named parameters.
    pub parameters: serde_json::Value,
}

/// One model step: either a final text, a set of tool calls, or both
/// (text accompanying the calls is carried along but the calls win).
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatReply {
    /// Whether this reply requests tool invocations.
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles() {
        assert_eq!(ChatMessage::user("hi").role, Role::User);
        assert_eq!(ChatMessage::assistant("yo").role, Role::Assistant);
        assert_eq!(ChatMessage::system("be nice").role, Role::System);
        let tool = ChatMessage::tool_result("call_1", "42");
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn reply_wants_tools_only_with_calls() {
        let plain = ChatReply {
            content: Some("done".into()),
            tool_calls: vec![],
        };
        assert!(!plain.wants_tools());

        let with_call = ChatReply {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "calculate".into(),
                arguments: serde_json::json!({"expression": "1+1"}),
            }],
        };
        assert!(with_call.wants_tools());
    }
}

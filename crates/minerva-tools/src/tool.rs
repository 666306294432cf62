// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait, registry, and the request-scoped invocation context.
//!
//! Every tool provides a name, description, JSON Schema for its parameters,
//! and an async `invoke`. Tool-level failures are reported through
//! [`ToolOutput::is_error`] so the agent loop can feed them back to the
//! model; only infrastructure failures surface as `Err`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use minerva_core::{MinervaError, ToolCallRecord, ToolCallStatus};
use minerva_providers::ToolDefinition;
use minerva_retrieval::{Embedder, VectorIndex};

/// Output from a tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Text returned to the model.
    pub content: String,
    /// Whether the invocation failed in a way the model should know about.
    pub is_error: bool,
}

impl ToolOutput {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// Ambient state available to a tool during one request.
///
/// Built per request; the record sink collects this turn's tool-call
/// records and is dropped with the context.
#[derive(Clone)]
pub struct ToolContext {
    /// Directory the file tools are confined to.
    pub allowed_dir: PathBuf,
    /// Conversation the current turn belongs to.
    pub conversation_id: String,
    /// Query embedding backend.
    pub embedder: Arc<dyn Embedder>,
    /// Knowledge-base vector index.
    pub vector: Arc<dyn VectorIndex>,
    /// Default result cap for knowledge searches.
    pub vector_max_results: usize,
    /// Similarity floor for knowledge searches.
    pub vector_min_score: f64,
    /// Request-scoped collector of tool-call records.
    pub records: RecordSink,
}

/// Request-scoped collector of [`ToolCallRecord`]s.
///
/// One record per invocation: created `Started`, finished in place. Cloned
/// handles share the same buffer for the lifetime of the request.
#[derive(Clone, Default)]
pub struct RecordSink {
    inner: Arc<Mutex<Vec<ToolCallRecord>>>,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the start of an invocation.
    pub fn start(&self, step: u32, tool_name: &str, input: serde_json::Value) {
        let mut records = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        records.push(ToolCallRecord {
            step,
            tool_name: tool_name.to_string(),
            input,
            result: None,
            duration_ms: 0,
            status: ToolCallStatus::Started,
        });
    }

    /// Finishes the record for `step` with its outcome.
    pub fn finish(&self, step: u32, status: ToolCallStatus, result: String, duration_ms: u64) {
        let mut records = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = records.iter_mut().rev().find(|r| r.step == step) {
            record.status = status;
            record.result = Some(result);
            record.duration_ms = duration_ms;
        }
    }

    /// Returns the records collected so far.
    pub fn snapshot(&self) -> Vec<ToolCallRecord> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Unified trait for all built-in tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, used for lookup and provider serialization.
    fn name(&self) -> &str;

    /// What the tool does, phrased for the model.
    fn description(&self) -> &str;

    /// JSON Schema describing the tool's named parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invokes the tool with the parsed arguments from the model.
    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError>;
}

/// Registry of available tools, indexed by name.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool. The tool is indexed by its `name()`.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Provider-facing definitions for all registered tools, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates model-supplied arguments against a tool's parameter schema.
///
/// Checks that the input is an object, that every required parameter is
/// present, and that present parameters have the declared primitive type.
/// Returns a description of the violation for the model to read.
pub fn validate_arguments(
    schema: &serde_json::Value,
    input: &serde_json::Value,
) -> Result<(), String> {
    let obj = match input.as_object() {
        Some(obj) => obj,
        None => return Err(format!("arguments must be a JSON object, got: {input}")),
    };

    if let Some(required) = schema["required"].as_array() {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !obj.contains_key(key) {
                return Err(format!("missing required parameter '{key}'"));
            }
        }
    }

    if let Some(properties) = schema["properties"].as_object() {
        for (key, value) in obj {
            let Some(spec) = properties.get(key) else {
                return Err(format!("unknown parameter '{key}'"));
            };
            let matches = match spec["type"].as_str() {
                Some("string") => value.is_string(),
                // Models routinely send numeric-looking strings; the tools
                // parse them, so both shapes pass schema validation.
                Some("number") | Some("integer") => value.is_number() || value.is_string(),
                Some("boolean") => value.is_boolean(),
                _ => true,
            };
            if !matches {
                return Err(format!(
                    "parameter '{key}' has wrong type, expected {}",
                    spec["type"].as_str().unwrap_or("unknown")
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the input back"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": {
                    "message": {"type": "string", "description": "Message to echo"}
                },
                "required": ["message"]
            })
        }

        async fn invoke(
            &self,
            _ctx: &ToolContext,
            input: serde_json::Value,
        ) -> Result<ToolOutput, MinervaError> {
            Ok(ToolOutput::ok(
                input["message"].as_str().unwrap_or_default().to_string(),
            ))
        }
    }

    #[test]
    fn registry_registers_and_retrieves() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nope").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn definitions_are_sorted_and_typed() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["type"], "object");
    }

    #[test]
    fn validate_accepts_conforming_arguments() {
        let schema = json!({
            "type": "object",
            "properties": {"query": {"type": "string"}, "maxResults": {"type": "integer"}},
            "required": ["query"]
        });
        assert!(validate_arguments(&schema, &json!({"query": "x"})).is_ok());
        assert!(validate_arguments(&schema, &json!({"query": "x", "maxResults": 3})).is_ok());
    }

    #[test]
    fn validate_rejects_missing_required() {
        let schema = json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        });
        let err = validate_arguments(&schema, &json!({})).unwrap_err();
        assert!(err.contains("query"));
    }

    #[test]
    fn validate_rejects_non_object() {
        let schema = json!({"type": "object", "properties": {}});
        assert!(validate_arguments(&schema, &json!("{not json")).is_err());
    }

    #[test]
    fn validate_rejects_wrong_type() {
        let schema = json!({
            "type": "object",
            "properties": {"query": {"type": "string"}},
            "required": ["query"]
        });
        let err = validate_arguments(&schema, &json!({"query": 5})).unwrap_err();
        assert!(err.contains("wrong type"));
    }

    #[test]
    fn numeric_parameters_accept_string_form() {
        let schema = json!({
            "type": "object",
            "properties": {"principal": {"type": "number"}},
            "required": ["principal"]
        });
        assert!(validate_arguments(&schema, &json!({"principal": "10万"})).is_ok());
    }

    #[test]
    fn record_sink_one_record_per_invocation() {
        let sink = RecordSink::new();
        sink.start(1, "searchKnowledge", json!({"query": "刘备"}));
        sink.finish(1, ToolCallStatus::Completed, "找到1条".into(), 12);

        let records = sink.snapshot();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ToolCallStatus::Completed);
        assert_eq!(records[0].result.as_deref(), Some("找到1条"));
        assert_eq!(records[0].duration_ms, 12);
    }

    #[test]
    fn record_sink_unfinished_records_stay_started() {
        let sink = RecordSink::new();
        sink.start(1, "getCurrentTime", json!({}));
        let records = sink.snapshot();
        assert_eq!(records[0].status, ToolCallStatus::Started);
        assert!(records[0].result.is_none());
    }
}

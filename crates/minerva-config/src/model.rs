// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Minerva service.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Keyword lists used by the router and the
//! calculator refusal check are configuration data, so deployments can
//! extend them without a rebuild; the compiled-in defaults reproduce the
//! stock behavior.

use serde::{Deserialize, Serialize};

/// Top-level Minerva configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MinervaConfig {
    /// Model routing strategy and keyword lists.
    #[serde(default)]
    pub router: RouterConfig,

    /// Agent loop and tool settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Vector index settings.
    #[serde(default)]
    pub vector: VectorConfig,

    /// Embedding model settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Local (Ollama) chat model settings.
    #[serde(default)]
    pub local_model: LocalModelConfig,

    /// Remote (OpenAI-compatible) chat model settings.
    #[serde(default)]
    pub remote_model: RemoteModelConfig,

    /// Conversation store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Routing strategy names accepted in configuration.
pub const STRATEGY_PERCENTAGE: &str = "percentage";
pub const STRATEGY_BUSINESS_TYPE: &str = "business_type";

/// Model routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// "percentage" or "business_type".
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Share of requests routed to the remote model under the
    /// percentage strategy, in [0, 100].
    #[serde(default = "default_percentage_remote")]
    pub percentage_remote: u8,

    /// Business types that route to the remote model under the
    /// business-type strategy. Unlisted types resolve to local.
    #[serde(default = "default_remote_types")]
    pub remote_types: Vec<String>,

    /// Keywords that classify a message as tool-calling.
    #[serde(default = "default_tool_keywords")]
    pub tool_keywords: Vec<String>,

    /// Keywords that classify a message as a complex query.
    #[serde(default = "default_complexity_keywords")]
    pub complexity_keywords: Vec<String>,

    /// Character count above which a message is long-context.
    #[serde(default = "default_long_context_chars")]
    pub long_context_chars: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            percentage_remote: default_percentage_remote(),
            remote_types: default_remote_types(),
            tool_keywords: default_tool_keywords(),
            complexity_keywords: default_complexity_keywords(),
            long_context_chars: default_long_context_chars(),
        }
    }
}

fn default_strategy() -> String {
    STRATEGY_PERCENTAGE.to_string()
}

fn default_percentage_remote() -> u8 {
    30
}

fn default_remote_types() -> Vec<String> {
    ["complex_query", "long_context", "high_precision"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_tool_keywords() -> Vec<String> {
    [
        "计算", "查询", "搜索", "天气", "时间", "IRR", "NPV", "债券", "期权", "摊销",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_complexity_keywords() -> Vec<String> {
    [
        "分析", "比较", "总结", "详细说明", "深入", "推理", "判断", "评估", "建议", "方案",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_long_context_chars() -> usize {
    200
}

/// Agent loop and tool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Number of prior conversation turns loaded into memory.
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Maximum model/tool iterations per turn.
    #[serde(default = "default_step_cap")]
    pub step_cap: u32,

    /// Directory the file tools are confined to.
    #[serde(default = "default_allowed_directory")]
    pub allowed_directory: String,

    /// Keywords that make the calculator refuse and point at the
    /// loan/financial tools instead.
    #[serde(default = "default_financial_keywords")]
    pub financial_keywords: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            step_cap: default_step_cap(),
            allowed_directory: default_allowed_directory(),
            financial_keywords: default_financial_keywords(),
        }
    }
}

fn default_context_window() -> usize {
    10
}

fn default_step_cap() -> u32 {
    8
}

fn default_allowed_directory() -> String {
    "./uploads".to_string()
}

fn default_financial_keywords() -> Vec<String> {
    [
        "本金", "利率", "摊销", "贷款", "月供", "还款", "等额本息", "等额本金", "房贷",
        "车贷", "IRR", "NPV", "久期", "期权",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Vector index configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VectorConfig {
    /// Qdrant-compatible REST endpoint.
    #[serde(default = "default_vector_base_url")]
    pub base_url: String,

    /// Collection holding the knowledge-base segments.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Default maximum results per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Minimum similarity score; matches below it are dropped.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_vector_base_url(),
            collection: default_collection(),
            max_results: default_max_results(),
            min_score: default_min_score(),
        }
    }
}

fn default_vector_base_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "knowledge-base".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_min_score() -> f64 {
    0.5
}

/// Embedding model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Ollama endpoint serving the embedding model.
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_embedding_model(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "qwen3-embedding:0.6b".to_string()
}

/// Local chat model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocalModelConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default = "default_local_model")]
    pub model: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_local_timeout")]
    pub timeout_secs: u64,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
            model: default_local_model(),
            timeout_secs: default_local_timeout(),
        }
    }
}

fn default_local_model() -> String {
    "qwen2.5:7b".to_string()
}

fn default_local_timeout() -> u64 {
    120
}

/// Remote chat model configuration (OpenAI-compatible).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteModelConfig {
    #[serde(default = "default_remote_base_url")]
    pub base_url: String,

    /// API key. `None` disables the remote model entirely.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_remote_model")]
    pub model: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

impl Default for RemoteModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_remote_base_url(),
            api_key: None,
            model: default_remote_model(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

fn default_remote_base_url() -> String {
    "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
}

fn default_remote_model() -> String {
    "qwen-plus".to_string()
}

fn default_remote_timeout() -> u64 {
    60
}

/// Conversation store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "minerva.db".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

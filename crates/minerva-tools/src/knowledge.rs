// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge-base retrieval as a tool.
//!
//! Wraps the embedding client and the vector index so the model can decide
//! for itself when the knowledge base is worth consulting.

use async_trait::async_trait;
use tracing::{info, warn};

use minerva_core::MinervaError;

use crate::tool::{Tool, ToolContext, ToolOutput};

/// Separator between formatted matches.
const MATCH_SEPARATOR: &str = "\n\n---\n\n";

/// Line returned when nothing clears the similarity floor.
pub const NO_MATCH_LINE: &str = "未在知识库中找到相关文档。";

/// Searches the knowledge base for segments relevant to a query.
pub struct SearchKnowledgeTool;

#[async_trait]
impl Tool for SearchKnowledgeTool {
    fn name(&self) -> &str {
        "searchKnowledge"
    }

    fn description(&self) -> &str {
        "在知识库中搜索相关文档。当用户询问文档或知识库中的信息、需要查找特定主题、\
         或需要引用文档内容回答问题时使用。参数：query 为搜索关键词或问题，\
         maxResults 为返回的最大结果数（默认5）。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "搜索关键词或问题"
                },
                "maxResults": {
                    "type": "integer",
                    "description": "返回的最大结果数，默认5"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> Result<ToolOutput, MinervaError> {
        let query = match input["query"].as_str() {
            Some(q) if !q.trim().is_empty() => q.to_string(),
            _ => return Ok(ToolOutput::error("缺少搜索关键词，请提供 query 参数。")),
        };
        let max_results = input["maxResults"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(ctx.vector_max_results);

        info!(query = query.as_str(), max_results, "knowledge search");

        let vector = match ctx.embedder.embed(&query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed");
                return Ok(ToolOutput::error(format!("向量检索失败: {e}")));
            }
        };

        let segments = match ctx
            .vector
            .search(&vector, max_results, ctx.vector_min_score)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "vector search failed");
                return Ok(ToolOutput::error(format!("向量检索失败: {e}")));
            }
        };

        if segments.is_empty() {
            return Ok(ToolOutput::ok(NO_MATCH_LINE));
        }

        let formatted = segments
            .iter()
            .map(|seg| {
                let filename = seg.metadata.filename.as_deref().unwrap_or("unknown");
                format!("[source={}, score={:.2}]\n{}", filename, seg.score, seg.text)
            })
            .collect::<Vec<_>>()
            .join(MATCH_SEPARATOR);

        info!(hits = segments.len(), "knowledge search complete");
        Ok(ToolOutput::ok(formatted))
    }
}

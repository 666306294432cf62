// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool registry and built-in tools for the Minerva agent.
//!
//! Tools are named, schema-described functions the model may invoke during
//! a turn. The registry maps names to descriptors; the ambient state a tool
//! needs (allowed directory, retrieval clients, the request-scoped record
//! sink) travels in [`ToolContext`].

pub mod calculator;
pub mod files;
pub mod finance;
pub mod knowledge;
pub mod stubs;
pub mod tool;

pub use calculator::CalculateTool;
pub use files::{GetFileInfoTool, ListDirectoryTool, ReadFileTool, SearchFilesTool};
pub use finance::{
    CalculateAmortizationTool, CalculateBondDurationTool, CalculateBondPriceTool,
    CalculateIrrTool, CalculateOptionPriceTool,
};
pub use knowledge::SearchKnowledgeTool;
pub use stubs::{GetCurrentTimeTool, GetWeatherTool};
pub use tool::{validate_arguments, RecordSink, Tool, ToolContext, ToolOutput, ToolRegistry};

use std::sync::Arc;

/// Registers the full built-in tool set.
///
/// `financial_keywords` is the refusal set for the basic calculator.
pub fn register_builtins(registry: &mut ToolRegistry, financial_keywords: Vec<String>) {
    registry.register(Arc::new(SearchKnowledgeTool));
    registry.register(Arc::new(ReadFileTool));
    registry.register(Arc::new(ListDirectoryTool));
    registry.register(Arc::new(SearchFilesTool));
    registry.register(Arc::new(GetFileInfoTool));
    registry.register(Arc::new(CalculateTool::new(financial_keywords)));
    registry.register(Arc::new(CalculateAmortizationTool));
    registry.register(Arc::new(CalculateIrrTool));
    registry.register(Arc::new(CalculateBondPriceTool));
    registry.register(Arc::new(CalculateBondDurationTool));
    registry.register(Arc::new(CalculateOptionPriceTool));
    registry.register(Arc::new(GetCurrentTimeTool));
    registry.register(Arc::new(GetWeatherTool));
}

// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic business-type classification of user messages.
//!
//! Rules are applied in a fixed order, first match wins. Keyword sets are
//! configuration data, not code, so deployments can extend them without a
//! rebuild; supplying the defaults reproduces stock behavior exactly.

use minerva_config::model::RouterConfig;
use minerva_core::BusinessType;

/// Classifies a message into a [`BusinessType`] from keyword and length rules.
#[derive(Debug)]
pub struct BusinessTypeDetector {
    tool_keywords: Vec<String>,
    complexity_keywords: Vec<String>,
    long_context_chars: usize,
}

impl BusinessTypeDetector {
    /// Builds a detector from the router configuration's keyword lists.
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            tool_keywords: config.tool_keywords.clone(),
            complexity_keywords: config.complexity_keywords.clone(),
            long_context_chars: config.long_context_chars,
        }
    }

    /// Classify a message. Applied in order, first match wins:
    ///
    /// 1. contains a tool keyword -> `ToolCalling`
    /// 2. contains a complexity keyword -> `ComplexQuery`
    /// 3. more than the configured character count -> `LongContext`
    /// 4. blank -> `GeneralChat`
    /// 5. otherwise -> `SimpleQa`
    pub fn detect(&self, message: &str) -> BusinessType {
        if self.tool_keywords.iter().any(|k| message.contains(k.as_str())) {
            return BusinessType::ToolCalling;
        }
        if self
            .complexity_keywords
            .iter()
            .any(|k| message.contains(k.as_str()))
        {
            return BusinessType::ComplexQuery;
        }
        if message.chars().count() > self.long_context_chars {
            return BusinessType::LongContext;
        }
        if message.trim().is_empty() {
            return BusinessType::GeneralChat;
        }
        BusinessType::SimpleQa
    }
}

// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tool-calling loop.
//!
//! Alternates between a model call and tool invocations until the model
//! produces a final text or the step cap is reached. Tool failures are
//! recovered locally (the error string re-enters memory); provider
//! failures abort the turn.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use minerva_core::{MinervaError, ToolCallRecord, ToolCallStatus};
use minerva_providers::{ChatMessage, ChatProvider};
use minerva_tools::{validate_arguments, ToolContext, ToolRegistry};

use crate::memory::ChatMemoryWindow;

/// Fixed reply when the model returns empty text.
pub const EMPTY_OUTPUT_FALLBACK: &str = "抱歉，我暂时无法回答这个问题。可能是因为：\n\
1. 问题表述不够清晰\n\
2. 知识库中没有相关内容\n\
3. 需要更具体的上下文信息\n\n\
请尝试重新表述您的问题，或者提供更多背景信息。";

/// Fixed reply when the loop hits its step cap.
pub const STEP_CAP_APOLOGY: &str =
    "抱歉，本次请求的处理步骤超出了限制，请尝试简化问题后重试。";

/// Result preview length kept in tool-call records.
const RECORD_RESULT_PREVIEW_CHARS: usize = 200;

/// Outcome of one agent turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Final assistant text (possibly a fallback or the degraded apology).
    pub text: String,
    /// One record per tool invocation, in invocation order.
    pub records: Vec<ToolCallRecord>,
    /// True when the step cap was exceeded and the apology substituted.
    pub degraded: bool,
}

/// Drives the tool-calling dialogue for one request.
pub struct AgentRunner {
    provider: Arc<dyn ChatProvider>,
    registry: Arc<ToolRegistry>,
    step_cap: u32,
}

impl AgentRunner {
    pub fn new(provider: Arc<dyn ChatProvider>, registry: Arc<ToolRegistry>, step_cap: u32) -> Self {
        Self {
            provider,
            registry,
            step_cap,
        }
    }

    /// Runs the loop to a final text.
    ///
    /// The user message is appended to memory first; on success the final
    /// assistant text is appended as well, so memory ends the turn
    /// consistent with what will be persisted.
    pub async fn run(
        &self,
        memory: &mut ChatMemoryWindow,
        ctx: &ToolContext,
        user_message: &str,
    ) -> Result<TurnOutcome, MinervaError> {
        memory.push(ChatMessage::user(user_message));

        let tools = self.registry.definitions();
        let mut invocation: u32 = 0;
        let mut malformed_rounds: u32 = 0;

        for step in 1..=self.step_cap {
            let reply = self.provider.chat(&memory.to_vec(), &tools).await?;

            if !reply.wants_tools() {
                let text = reply
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| {
                        warn!("model returned empty text, substituting fallback");
                        EMPTY_OUTPUT_FALLBACK.to_string()
                    });
                memory.push(ChatMessage::assistant(text.clone()));
                info!(steps = step, invocations = invocation, "turn complete");
                return Ok(TurnOutcome {
                    text,
                    records: ctx.records.snapshot(),
                    degraded: false,
                });
            }

            memory.push(ChatMessage::assistant_tool_calls(reply.tool_calls.clone()));

            let mut round_malformed = false;
            for call in reply.tool_calls {
                let Some(tool) = self.registry.get(&call.name) else {
                    warn!(tool = call.name.as_str(), "model requested unknown tool");
                    invocation += 1;
                    ctx.records.start(invocation, &call.name, call.arguments.clone());
                    ctx.records.finish(
                        invocation,
                        ToolCallStatus::Failed,
                        "未知工具".to_string(),
                        0,
                    );
                    memory.push(ChatMessage::tool_result(
                        call.id,
                        format!("未知工具: {}，请从可用工具中选择。", call.name),
                    ));
                    continue;
                };

                if let Err(violation) =
                    validate_arguments(&tool.parameters_schema(), &call.arguments)
                {
                    warn!(
                        tool = call.name.as_str(),
                        violation = violation.as_str(),
                        "malformed tool arguments"
                    );
                    round_malformed = true;
                    memory.push(ChatMessage::tool_result(
                        call.id,
                        format!("工具 {} 的参数不符合定义: {violation}。请修正参数后重试。", call.name),
                    ));
                    continue;
                }

                invocation += 1;
                ctx.records.start(invocation, &call.name, call.arguments.clone());
                let started = Instant::now();

                match tool.invoke(ctx, call.arguments).await {
                    Ok(output) => {
                        let status = if output.is_error {
                            ToolCallStatus::Failed
                        } else {
                            ToolCallStatus::Completed
                        };
                        ctx.records.finish(
                            invocation,
                            status,
                            preview(&output.content),
                            started.elapsed().as_millis() as u64,
                        );
                        memory.push(ChatMessage::tool_result(call.id, output.content));
                    }
                    Err(e) => {
                        ctx.records.finish(
                            invocation,
                            ToolCallStatus::Failed,
                            e.to_string(),
                            started.elapsed().as_millis() as u64,
                        );
                        memory.push(ChatMessage::tool_result(
                            call.id,
                            format!("工具执行失败: {e}"),
                        ));
                    }
                }
            }

            if round_malformed {
                malformed_rounds += 1;
                if malformed_rounds >= 2 {
                    return Err(MinervaError::InvalidInput(
                        "tool arguments malformed twice in a row".into(),
                    ));
                }
            } else {
                malformed_rounds = 0;
            }
        }

        warn!(cap = self.step_cap, "agent loop exceeded step cap, degrading");
        memory.push(ChatMessage::assistant(STEP_CAP_APOLOGY));
        Ok(TurnOutcome {
            text: STEP_CAP_APOLOGY.to_string(),
            records: ctx.records.snapshot(),
            degraded: true,
        })
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() > RECORD_RESULT_PREVIEW_CHARS {
        let head: String = content.chars().take(RECORD_RESULT_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}

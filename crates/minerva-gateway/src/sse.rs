// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events streaming for `POST /agent/stream`.
//!
//! Event sequence for a successful turn: zero or more `message` frames,
//! exactly one `agent-history` frame with the turn's tool-call records,
//! then one `done` frame carrying the conversation id. A terminal failure
//! emits one `error` frame and closes.
//!
//! The turn runs in its own task; a channel of typed [`TurnEvent`]s feeds
//! this emitter. When the client disconnects, emission stops but the turn
//! task runs to completion and its result is persisted.

use std::convert::Infallible;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use minerva_agent::{segment, AgentRunner, ChatMemoryWindow, TurnEvent, SEGMENT_PACING};
use minerva_core::{NewMessage, Role, AGENT_CONVERSATION_PREFIX};
use minerva_tools::{RecordSink, ToolContext};

use crate::handlers::ErrorResponse;
use crate::server::AppState;

/// Request body for `POST /agent/stream`.
#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    /// User message text.
    pub message: String,
    /// Conversation to continue; a fresh `agent-` id is minted when absent.
    #[serde(default, rename = "conversationId")]
    pub conversation_id: Option<String>,
}

/// POST /agent/stream
pub async fn stream_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<StreamRequest>,
) -> Response {
    let Some(user_id) = state.auth.current_user_id(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "请先登录".to_string(),
            }),
        )
            .into_response();
    };

    if body.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "消息不能为空".to_string(),
            }),
        )
            .into_response();
    }

    let conversation_id = body
        .conversation_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("{AGENT_CONVERSATION_PREFIX}{}", Uuid::new_v4()));

    info!(
        conversation = conversation_id.as_str(),
        user = user_id.as_str(),
        "agent stream request"
    );

    let (tx, rx) = mpsc::channel::<TurnEvent>(32);
    tokio::spawn(run_turn(
        state,
        user_id,
        conversation_id,
        body.message,
        tx,
    ));

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv()
            .await
            .map(|event| (Ok::<_, Infallible>(sse_frame(event)), rx))
    });

    Sse::new(stream).into_response()
}

/// Translates a typed turn event into an SSE frame.
fn sse_frame(event: TurnEvent) -> Event {
    match event {
        // SSE data fields cannot carry carriage returns.
        TurnEvent::Segment(text) => Event::default().event("message").data(text.replace('\r', "")),
        TurnEvent::History(records) => Event::default().event("agent-history").data(
            serde_json::to_string(&records).unwrap_or_else(|_| "[]".to_string()),
        ),
        TurnEvent::Done(conversation_id) => Event::default().event("done").data(conversation_id),
        TurnEvent::Error(message) => Event::default().event("error").data(message),
    }
}

/// Runs one agent turn and feeds events into `tx`.
///
/// Persists both rows of the turn in a single transaction before any
/// segment is emitted, so a client disconnect can never leave a
/// user-row-only conversation. Send failures are ignored: the receiver
/// disappearing means the client went away, not that the turn failed.
pub async fn run_turn(
    state: AppState,
    user_id: String,
    conversation_id: String,
    message: String,
    tx: mpsc::Sender<TurnEvent>,
) {
    let started_at = chrono::Utc::now().to_rfc3339();

    let decision = state.router.route(&message);
    let provider = state.provider_for(&decision);
    info!(
        model = decision.model_id.as_str(),
        provider = %decision.provider,
        reason = decision.reason.as_str(),
        "model selected"
    );

    let mut memory = match ChatMemoryWindow::load(
        state.settings.context_window,
        &state.db,
        &conversation_id,
    )
    .await
    {
        Ok(memory) => memory,
        Err(e) => {
            error!(error = %e, "failed to load conversation memory");
            let _ = tx.send(TurnEvent::Error("会话历史加载失败".to_string())).await;
            return;
        }
    };

    let ctx = ToolContext {
        allowed_dir: state.settings.allowed_directory.clone(),
        conversation_id: conversation_id.clone(),
        embedder: state.embedder.clone(),
        vector: state.vector.clone(),
        vector_max_results: state.settings.vector_max_results,
        vector_min_score: state.settings.vector_min_score,
        records: RecordSink::new(),
    };

    let runner = AgentRunner::new(provider, state.registry.clone(), state.settings.step_cap);
    let outcome = match runner.run(&mut memory, &ctx, &message).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "agent turn failed");
            let _ = tx.send(TurnEvent::Error("处理请求时发生错误，请稍后重试".to_string())).await;
            return;
        }
    };

    if outcome.degraded {
        warn!(conversation = conversation_id.as_str(), "turn degraded by step cap");
    }

    let user_row = NewMessage {
        conversation_id: conversation_id.clone(),
        user_id: Some(user_id.clone()),
        role: Role::User,
        content: message,
        sources: None,
        created_at: started_at,
    };
    let assistant_row = NewMessage {
        conversation_id: conversation_id.clone(),
        user_id: Some(user_id),
        role: Role::Assistant,
        content: outcome.text.clone(),
        sources: None,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    if let Err(e) = minerva_storage::append_turn(&state.db, &user_row, &assistant_row).await {
        error!(error = %e, "failed to persist turn");
        let _ = tx.send(TurnEvent::Error("保存对话失败".to_string())).await;
        return;
    }

    for piece in segment(&outcome.text) {
        if piece.trim().is_empty() {
            continue;
        }
        if tx.send(TurnEvent::Segment(piece)).await.is_err() {
            // Client gone; the turn is already persisted.
            return;
        }
        tokio::time::sleep(SEGMENT_PACING).await;
    }

    let _ = tx.send(TurnEvent::History(outcome.records)).await;
    let _ = tx.send(TurnEvent::Done(conversation_id)).await;
}

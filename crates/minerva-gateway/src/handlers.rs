// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST handlers for conversation history and lifecycle.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info};

use minerva_core::AGENT_CONVERSATION_PREFIX;

use crate::server::AppState;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "请先登录".to_string(),
        }),
    )
        .into_response()
}

fn storage_failure(e: minerva_core::MinervaError) -> Response {
    error!(error = %e, "storage operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "存储操作失败".to_string(),
        }),
    )
        .into_response()
}

/// GET /agent/history/{conversation_id}
///
/// Returns the conversation's full ordered message list.
pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
) -> Response {
    if state.auth.current_user_id(&headers).is_none() {
        return unauthorized();
    }

    match minerva_storage::history(&state.db, &conversation_id).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// GET /agent/conversations
///
/// Returns the user's agent conversations, newest activity first.
pub async fn get_conversations(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(user_id) = state.auth.current_user_id(&headers) else {
        return unauthorized();
    };

    match minerva_storage::conversations_for(&state.db, &user_id, AGENT_CONVERSATION_PREFIX).await
    {
        Ok(ids) => Json(ids).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// DELETE /agent/conversations/{conversation_id}
///
/// Removes every message of the conversation.
pub async fn delete_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(conversation_id): Path<String>,
) -> Response {
    let Some(user_id) = state.auth.current_user_id(&headers) else {
        return unauthorized();
    };

    match minerva_storage::delete_conversation(&state.db, &conversation_id).await {
        Ok(deleted) => {
            info!(
                conversation = conversation_id.as_str(),
                user = user_id.as_str(),
                deleted,
                "conversation deleted"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => storage_failure(e),
    }
}

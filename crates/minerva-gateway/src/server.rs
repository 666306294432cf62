// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, CORS, and the shared state handed to request handlers.
//! All shared resources are process-wide singletons behind `Arc`, read-mostly
//! after init.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use minerva_core::{MinervaError, ProviderKind, RoutingDecision};
use minerva_providers::ChatProvider;
use minerva_retrieval::{Embedder, VectorIndex};
use minerva_router::ModelRouter;
use minerva_storage::Database;
use minerva_tools::ToolRegistry;

use crate::auth::SessionAuth;
use crate::{handlers, sse};

/// Per-turn settings resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Prior turns loaded into memory.
    pub context_window: usize,
    /// Agent loop iteration bound.
    pub step_cap: u32,
    /// Directory the file tools are confined to.
    pub allowed_directory: std::path::PathBuf,
    /// Knowledge-search result cap.
    pub vector_max_results: usize,
    /// Knowledge-search similarity floor.
    pub vector_min_score: f64,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub router: Arc<ModelRouter>,
    pub local: Arc<dyn ChatProvider>,
    pub remote: Option<Arc<dyn ChatProvider>>,
    pub registry: Arc<ToolRegistry>,
    pub embedder: Arc<dyn Embedder>,
    pub vector: Arc<dyn VectorIndex>,
    pub auth: Arc<dyn SessionAuth>,
    pub settings: TurnSettings,
}

impl AppState {
    /// Maps a routing decision to the registered handle.
    pub fn provider_for(&self, decision: &RoutingDecision) -> Arc<dyn ChatProvider> {
        match decision.provider {
            ProviderKind::Remote => self
                .remote
                .clone()
                .unwrap_or_else(|| self.local.clone()),
            ProviderKind::Local => self.local.clone(),
        }
    }
}

/// Builds the gateway route tree.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/agent/stream", post(sse::stream_chat))
        .route("/agent/history/{conversation_id}", get(handlers::get_history))
        .route("/agent/conversations", get(handlers::get_conversations))
        .route(
            "/agent/conversations/{conversation_id}",
            delete(handlers::delete_conversation),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds and serves the gateway until the process exits.
pub async fn start_server(host: &str, port: u16, state: AppState) -> Result<(), MinervaError> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MinervaError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| MinervaError::Internal(format!("gateway server error: {e}")))
}

// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires configuration into the running service.

use std::sync::Arc;

use tracing::info;

use minerva_config::MinervaConfig;
use minerva_core::MinervaError;
use minerva_gateway::{start_server, AppState, HeaderSessionAuth, TurnSettings};
use minerva_providers::{ChatProvider, OllamaProvider, OpenAiCompatProvider};
use minerva_retrieval::{OllamaEmbedder, QdrantIndex};
use minerva_router::ModelRouter;
use minerva_storage::Database;
use minerva_tools::{register_builtins, ToolRegistry};

/// Builds every subsystem from configuration and serves until shutdown.
pub async fn serve(config: MinervaConfig) -> Result<(), MinervaError> {
    let db = Arc::new(Database::open(&config.storage.database_path).await?);

    let local: Arc<dyn ChatProvider> = Arc::new(OllamaProvider::new(&config.local_model)?);
    let remote: Option<Arc<dyn ChatProvider>> = if config.remote_model.api_key.is_some() {
        let provider = OpenAiCompatProvider::new(&config.remote_model)?;
        info!(model = provider.model_id(), "remote model registered");
        Some(Arc::new(provider))
    } else {
        info!("remote model not configured, all requests route to local");
        None
    };

    let router = ModelRouter::new(
        &config.router,
        local.model_id().to_string(),
        remote.as_ref().map(|r| r.model_id().to_string()),
    )?;

    let mut registry = ToolRegistry::new();
    register_builtins(&mut registry, config.agent.financial_keywords.clone());
    info!(tools = registry.len(), "tool registry ready");

    let state = AppState {
        db,
        router: Arc::new(router),
        local,
        remote,
        registry: Arc::new(registry),
        embedder: Arc::new(OllamaEmbedder::new(&config.embedding)?),
        vector: Arc::new(QdrantIndex::new(&config.vector)?),
        auth: Arc::new(HeaderSessionAuth::new()),
        settings: TurnSettings {
            context_window: config.agent.context_window,
            step_cap: config.agent.step_cap,
            allowed_directory: config.agent.allowed_directory.clone().into(),
            vector_max_results: config.vector.max_results,
            vector_min_score: config.vector.min_score,
        },
    };

    start_server(&config.gateway.host, config.gateway.port, state).await
}

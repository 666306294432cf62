// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding client speaking the Ollama embeddings API.
//!
//! Turns a query string into a dense vector with one POST to
//! `{base_url}/api/embeddings`. The vector dimension is whatever the
//! configured model produces; callers treat it as opaque.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use minerva_config::model::EmbeddingConfig;
use minerva_core::MinervaError;

/// Seam over the embedding backend so tests can supply a fixed embedder.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds one piece of text into a dense vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MinervaError>;
}

/// Embedding client backed by an Ollama server.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Builds an embedder from configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, MinervaError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| MinervaError::VectorBackend {
                message: format!("failed to build embedding HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, MinervaError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MinervaError::VectorBackend {
                message: format!("embedding request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MinervaError::VectorBackend {
                message: format!("embedding model returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: EmbeddingsResponse =
            response.json().await.map_err(|e| MinervaError::VectorBackend {
                message: format!("failed to parse embedding response: {e}"),
                source: Some(Box::new(e)),
            })?;

        if parsed.embedding.is_empty() {
            return Err(MinervaError::VectorBackend {
                message: "embedding model returned an empty vector".to_string(),
                source: None,
            });
        }

        debug!(dims = parsed.embedding.len(), "embedded query");
        Ok(parsed.embedding)
    }
}

// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector index client speaking a Qdrant-compatible REST search API.
//!
//! The core only needs one operation: nearest-neighbour search with a
//! result cap and a similarity floor. The wire format is a provider
//! concern; this client maps payload keys into [`VectorSegment`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use minerva_config::model::VectorConfig;
use minerva_core::{MinervaError, SegmentMetadata, VectorSegment};

/// Seam over the vector backend so tests can supply an in-memory index.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Nearest-neighbour search. Results are ordered by score descending
    /// and every returned segment has `score >= min_score`.
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        min_score: f64,
    ) -> Result<Vec<VectorSegment>, MinervaError>;
}

/// Vector index backed by a Qdrant-compatible REST endpoint.
pub struct QdrantIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    score: f64,
    #[serde(default)]
    payload: Option<HitPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct HitPayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    document_id: Option<String>,
    #[serde(default)]
    chunk_index: Option<u32>,
}

impl QdrantIndex {
    /// Builds a search client from configuration.
    pub fn new(config: &VectorConfig) -> Result<Self, MinervaError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| MinervaError::VectorBackend {
                message: format!("failed to build vector HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
        })
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        vector: &[f32],
        k: usize,
        min_score: f64,
    ) -> Result<Vec<VectorSegment>, MinervaError> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let body = serde_json::json!({
            "vector": vector,
            "limit": k,
            "score_threshold": min_score,
            "with_payload": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| MinervaError::VectorBackend {
                message: format!("vector search request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MinervaError::VectorBackend {
                message: format!("vector store returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: SearchResponse =
            response.json().await.map_err(|e| MinervaError::VectorBackend {
                message: format!("failed to parse vector search response: {e}"),
                source: Some(Box::new(e)),
            })?;

        // The threshold is also sent server-side; re-checking here keeps the
        // floor invariant independent of backend behavior.
        let segments: Vec<VectorSegment> = parsed
            .result
            .into_iter()
            .filter(|hit| hit.score >= min_score)
            .map(|hit| {
                let payload = hit.payload.unwrap_or_default();
                VectorSegment {
                    text: payload.text.unwrap_or_default(),
                    metadata: SegmentMetadata {
                        filename: payload.filename,
                        document_id: payload.document_id,
                        chunk_index: payload.chunk_index,
                    },
                    score: hit.score,
                }
            })
            .collect();

        debug!(hits = segments.len(), k, min_score, "vector search complete");
        Ok(segments)
    }
}

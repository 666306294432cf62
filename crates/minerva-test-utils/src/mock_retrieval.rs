// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory retrieval doubles: a fixed embedder and a seedable vector
//! index that honours the score floor and result cap.

use std::sync::Mutex;

use async_trait::async_trait;

use minerva_core::{MinervaError, SegmentMetadata, VectorSegment};
use minerva_retrieval::{Embedder, VectorIndex};

/// Embedder that returns the same vector for every input.
pub struct FixedEmbedder;

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, MinervaError> {
        Ok(vec![1.0, 0.0, 0.0])
    }
}

/// Vector index over a seeded in-memory segment list.
#[derive(Default)]
pub struct MemoryVectorIndex {
    segments: Mutex<Vec<VectorSegment>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one segment with the given text, filename, and score.
    pub fn seed(&self, text: &str, filename: &str, score: f64) {
        self.segments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(VectorSegment {
                text: text.to_string(),
                metadata: SegmentMetadata {
                    filename: Some(filename.to_string()),
                    document_id: None,
                    chunk_index: None,
                },
                score,
            });
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn search(
        &self,
        _vector: &[f32],
        k: usize,
        min_score: f64,
    ) -> Result<Vec<VectorSegment>, MinervaError> {
        let mut hits: Vec<VectorSegment> = self
            .segments
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|s| s.score >= min_score)
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }
}

// SPDX-FileCopyrightText: 2026 Minerva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval clients for the Minerva service: query embedding and
//! nearest-neighbour search over the knowledge-base vector store.

pub mod embedder;
pub mod vector;

pub use embedder::{Embedder, OllamaEmbedder};
pub use vector::{QdrantIndex, VectorIndex};

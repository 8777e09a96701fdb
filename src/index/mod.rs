//! In-memory vector index with on-disk persistence
//!
//! Stores (embedding, chunk) pairs and answers k-nearest-neighbor queries by
//! an exact cosine scan, which is plenty for a corpus of a few thousand pages.
//! The serialized blob records the embedding model id and dimensionality so a
//! reload against a different embedder fails loudly instead of silently
//! returning garbage.

pub mod lifecycle;

use crate::embedding::Embedder;
use crate::error::{IndexError, RagError};
use crate::ingest::Chunk;
use serde::{Deserialize, Serialize};
use std::path::Path;

const INDEX_FILE: &str = "index.json";
const FORMAT_VERSION: u32 = 1;
const METRIC: &str = "cosine";

/// A retrieved chunk with its similarity score
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexEntry {
    vector: Vec<f32>,
    chunk: Chunk,
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    model: String,
    dimension: usize,
    metric: String,
    entries: Vec<IndexEntry>,
}

/// The active nearest-neighbor index over the ingested corpus
#[derive(Debug)]
pub struct VectorIndex {
    model: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embed every chunk and construct the index
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self, RagError> {
        if chunks.is_empty() {
            return Err(IndexError::EmptyCorpus.into());
        }

        tracing::info!("Embedding {} chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&texts).await?;

        let dimension = embedder.dimension();
        for vector in &vectors {
            if vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    stored: vector.len(),
                    current: dimension,
                }
                .into());
            }
        }

        let entries = vectors
            .into_iter()
            .zip(chunks)
            .map(|(vector, chunk)| IndexEntry { vector, chunk })
            .collect();

        Ok(Self {
            model: embedder.model_id().to_string(),
            dimension,
            entries,
        })
    }

    /// Serialize the index to a directory, creating it if absent
    ///
    /// The blob is written to a temporary file and renamed into place so a
    /// concurrent reader never observes a half-written index.
    pub fn save(&self, dir: &Path) -> Result<(), IndexError> {
        std::fs::create_dir_all(dir).map_err(|e| IndexError::SaveFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Borrowing serializer twin of PersistedIndex so vectors are not cloned
        #[derive(Serialize)]
        struct PersistedIndexRef<'a> {
            version: u32,
            model: &'a str,
            dimension: usize,
            metric: &'a str,
            entries: &'a [IndexEntry],
        }

        let persisted = PersistedIndexRef {
            version: FORMAT_VERSION,
            model: &self.model,
            dimension: self.dimension,
            metric: METRIC,
            entries: &self.entries,
        };

        let tmp_path = dir.join(format!("{}.tmp", INDEX_FILE));
        let final_path = dir.join(INDEX_FILE);

        let data = serde_json::to_string(&persisted).map_err(|e| IndexError::SaveFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::write(&tmp_path, data).map_err(|e| IndexError::SaveFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| IndexError::SaveFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::info!("Saved {} entries to {}", self.entries.len(), dir.display());
        Ok(())
    }

    /// Deserialize an index, verifying it matches the given embedder
    pub fn load(dir: &Path, embedder: &dyn Embedder) -> Result<Self, IndexError> {
        let path = dir.join(INDEX_FILE);
        if !path.exists() {
            return Err(IndexError::NotFound(dir.to_path_buf()));
        }

        let data = std::fs::read_to_string(&path).map_err(|e| IndexError::Corrupted {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let persisted: PersistedIndex =
            serde_json::from_str(&data).map_err(|e| IndexError::Corrupted {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;

        if persisted.version != FORMAT_VERSION {
            return Err(IndexError::Corrupted {
                path: dir.to_path_buf(),
                reason: format!("unsupported format version {}", persisted.version),
            });
        }
        if persisted.metric != METRIC {
            return Err(IndexError::Corrupted {
                path: dir.to_path_buf(),
                reason: format!("unsupported distance metric '{}'", persisted.metric),
            });
        }
        if persisted.model != embedder.model_id() {
            return Err(IndexError::ModelMismatch {
                stored: persisted.model,
                current: embedder.model_id().to_string(),
            });
        }
        if persisted.dimension != embedder.dimension() {
            return Err(IndexError::DimensionMismatch {
                stored: persisted.dimension,
                current: embedder.dimension(),
            });
        }

        tracing::info!(
            "Loaded {} entries from {}",
            persisted.entries.len(),
            dir.display()
        );

        Ok(Self {
            model: persisted.model,
            dimension: persisted.dimension,
            entries: persisted.entries,
        })
    }

    /// Return the k nearest chunks to the query text, best first
    ///
    /// If the index holds fewer than `k` entries, all of them are returned.
    pub async fn query(
        &self,
        query_text: &str,
        k: usize,
        embedder: &dyn Embedder,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        let k = k.max(1);

        let query_batch = [query_text.to_string()];
        let query_vector = embedder
            .embed(&query_batch)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::other("embedder returned no vector for query"))?;

        if query_vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                stored: self.dimension,
                current: query_vector.len(),
            }
            .into());
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&query_vector, &entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn model_id(&self) -> &str {
        &self.model
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

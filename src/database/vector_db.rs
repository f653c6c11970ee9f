use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::cmp::Ordering;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum VectorDBError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Operation failed: {0}")]
    Operation(String),
    #[error("Embedding has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Got {embeddings} embeddings for {texts} texts")]
    LengthMismatch { texts: usize, embeddings: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    /// Backend specific: L2 distance in memory (lower is closer), cosine
    /// similarity in Qdrant (higher is closer). Results are always ordered
    /// best first.
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Stores texts with their embeddings and returns the new ids.
    async fn add(&self, texts: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Vec<String>, VectorDBError>;

    /// The `k` closest chunks to `query`, best first.
    async fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, VectorDBError>;

    async fn len(&self) -> Result<usize, VectorDBError>;

    fn backend(&self) -> &'static str;
}

struct Entry {
    id: String,
    text: String,
    vector: Vec<f32>,
}

/// Exact nearest neighbour search over every stored vector.
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn dimension(&self) -> Option<usize> {
        self.entries.read().first().map(|e| e.vector.len())
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, texts: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<Vec<String>, VectorDBError> {
        if texts.len() != embeddings.len() {
            return Err(VectorDBError::LengthMismatch {
                texts: texts.len(),
                embeddings: embeddings.len(),
            });
        }

        let expected = self
            .dimension()
            .or_else(|| embeddings.first().map(Vec::len))
            .unwrap_or(0);
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(VectorDBError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        let mut entries = self.entries.write();
        let mut ids = Vec::with_capacity(texts.len());
        for (text, vector) in texts.into_iter().zip(embeddings) {
            let id = Uuid::new_v4().to_string();
            ids.push(id.clone());
            entries.push(Entry { id, text, vector });
        }
        Ok(ids)
    }

    async fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, VectorDBError> {
        let entries = self.entries.read();
        if let Some(first) = entries.first() {
            if first.vector.len() != query.len() {
                return Err(VectorDBError::DimensionMismatch {
                    expected: first.vector.len(),
                    actual: query.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, squared_l2(&entry.vector, query)))
            .collect();
        // stable sort keeps insertion order between equal distances
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                id: entries[i].id.clone(),
                text: entries[i].text.clone(),
                score,
            })
            .collect())
    }

    async fn len(&self) -> Result<usize, VectorDBError> {
        Ok(self.entries.read().len())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

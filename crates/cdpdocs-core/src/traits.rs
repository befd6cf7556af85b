use crate::error::Result;
use crate::types::{DocumentChunk, Position};

/// Deterministic text → fixed-length vector mapping.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Append-only nearest-neighbour index addressed by insertion position.
pub trait VectorIndexer: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn add(&self, vector: Vec<f32>) -> Result<Position>;
    /// Up to `k` `(position, distance)` pairs, nearest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Position, f32)>>;
}

/// Platform-partitioned document storage with exact and full-text lookup.
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` is the ordinary miss, not a failure.
    fn get_by_id(&self, platform: &str, id: &str) -> Result<Option<DocumentChunk>>;
    /// Up to `k` hits ordered by descending relevance.
    fn query_by_text(&self, platform: &str, query: &str, k: usize) -> Result<Vec<(DocumentChunk, f32)>>;
    fn put(&self, platform: &str, id: &str, document: &DocumentChunk) -> Result<()>;
}

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{instrument, warn};

use cdpdocs_core::error::{Error, Result};
use cdpdocs_core::traits::{DocumentStore, Embedder, VectorIndexer};
use cdpdocs_core::types::{canonical_platform, DocumentChunk, Position};

use crate::blocking::{embedder_error, run_blocking};

/// Writes a chunk to both sides under one id: the vector's position.
///
/// `add` and `put` run under a single async mutex, so positions are handed out
/// and bound to their documents one at a time. If `put` fails the vector stays
/// in the index without a document; retrieval skips such positions.
pub struct IndexingPipeline<V, D> {
    embedder: Arc<dyn Embedder>,
    index: Arc<V>,
    store: Arc<D>,
    write_lock: Mutex<()>,
}

impl<V, D> IndexingPipeline<V, D>
where
    V: VectorIndexer + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<V>, store: Arc<D>) -> Self {
        Self { embedder, index, store, write_lock: Mutex::new(()) }
    }

    #[instrument(skip_all, fields(platform = %chunk.platform))]
    pub async fn index_document(&self, mut chunk: DocumentChunk) -> Result<Position> {
        if chunk.content.trim().is_empty() {
            return Err(Error::InvalidInput("document content is empty".into()));
        }
        chunk.platform = canonical_platform(&chunk.platform);
        if chunk.platform.is_empty() {
            return Err(Error::InvalidInput("document platform is empty".into()));
        }

        let embedder = Arc::clone(&self.embedder);
        let content = chunk.content.clone();
        let embedding = run_blocking("embedding document", move || embedder.embed(&content))
            .await
            .map_err(|e| embedder_error("embedding document", e))?;
        if embedding.len() != self.index.dim() {
            return Err(Error::DimensionMismatch { expected: self.index.dim(), actual: embedding.len() });
        }

        let _guard = self.write_lock.lock().await;
        let index = Arc::clone(&self.index);
        let store = Arc::clone(&self.store);
        run_blocking("indexing document", move || {
            let position = index.add(embedding)?;
            if let Err(e) = store.put(&chunk.platform, &position.doc_id(), &chunk) {
                warn!(%position, error = %e, "document write failed after vector add");
                return Err(e);
            }
            Ok(position)
        })
        .await
    }

    /// Index chunks one after another, stopping at the first failure.
    pub async fn index_documents(&self, chunks: Vec<DocumentChunk>) -> Result<Vec<Position>> {
        let mut positions = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            positions.push(self.index_document(chunk).await?);
        }
        Ok(positions)
    }
}

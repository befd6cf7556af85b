use std::sync::Arc;

use tracing::{debug, instrument};

use cdpdocs_core::error::{Error, Result};
use cdpdocs_core::traits::{DocumentStore, Embedder, VectorIndexer};
use cdpdocs_core::types::{canonical_platform, SearchResult};
use cdpdocs_vector::similarity;

use crate::blocking::{embedder_error, run_blocking};
use crate::fusion::fuse;

/// Fans a query out to the vector index and the keyword store, then fuses.
/// Holds only shared handles; the index and store belong to the service.
pub struct HybridRetriever<V, D> {
    embedder: Arc<dyn Embedder>,
    index: Arc<V>,
    store: Arc<D>,
    semantic_weight: f32,
}

impl<V, D> HybridRetriever<V, D>
where
    V: VectorIndexer + 'static,
    D: DocumentStore + 'static,
{
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<V>, store: Arc<D>, semantic_weight: f32) -> Result<Self> {
        check_weight(semantic_weight)?;
        Ok(Self { embedder, index, store, semantic_weight })
    }

    pub fn semantic_weight(&self) -> f32 {
        self.semantic_weight
    }

    pub async fn retrieve(&self, query: &str, platform: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        self.retrieve_weighted(query, platform, top_k, self.semantic_weight).await
    }

    /// Same as [`retrieve`](Self::retrieve) with an explicit semantic weight.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn retrieve_weighted(&self, query: &str, platform: &str, top_k: usize, semantic_weight: f32) -> Result<Vec<SearchResult>> {
        check_weight(semantic_weight)?;
        let platform = canonical_platform(platform);

        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let query_vector = run_blocking("embedding query", move || embedder.embed(&text))
            .await
            .map_err(|e| embedder_error("embedding query", e))?;
        if query_vector.len() != self.index.dim() {
            return Err(Error::DimensionMismatch { expected: self.index.dim(), actual: query_vector.len() });
        }

        let semantic = {
            let index = Arc::clone(&self.index);
            let store = Arc::clone(&self.store);
            let platform = platform.clone();
            run_blocking("semantic search", move || semantic_hits(index.as_ref(), store.as_ref(), &platform, &query_vector, top_k))
        };
        let keyword = {
            let store = Arc::clone(&self.store);
            let platform = platform.clone();
            let text = query.to_string();
            run_blocking("keyword search", move || {
                let hits = store.query_by_text(&platform, &text, top_k)?;
                Ok(hits.into_iter().map(|(chunk, score)| SearchResult::from_chunk(chunk, score)).collect::<Vec<_>>())
            })
        };
        let (semantic, keyword) = tokio::try_join!(semantic, keyword)?;

        debug!(semantic = semantic.len(), keyword = keyword.len(), "fusing sub-search results");
        Ok(fuse(semantic, keyword, semantic_weight))
    }
}

fn check_weight(weight: f32) -> Result<()> {
    if (0.0..=1.0).contains(&weight) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("semantic weight must be within [0, 1], got {weight}")))
    }
}

/// Nearest vectors resolved to stored chunks. Positions without a document in
/// this platform's partition are dropped.
fn semantic_hits<V, D>(index: &V, store: &D, platform: &str, query: &[f32], k: usize) -> Result<Vec<SearchResult>>
where
    V: VectorIndexer + ?Sized,
    D: DocumentStore + ?Sized,
{
    let mut hits = Vec::new();
    for (position, distance) in index.search(query, k)? {
        match store.get_by_id(platform, &position.doc_id())? {
            Some(chunk) => hits.push(SearchResult::from_chunk(chunk, similarity(distance))),
            None => debug!(%position, platform, "no stored document for vector, skipping"),
        }
    }
    Ok(hits)
}

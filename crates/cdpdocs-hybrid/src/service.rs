use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use cdpdocs_core::config::Settings;
use cdpdocs_core::error::{Error, Result};
use cdpdocs_core::traits::{DocumentStore, Embedder, VectorIndexer};
use cdpdocs_core::types::{canonical_platform, DocumentChunk, Position, SearchResult};
use cdpdocs_embed::build_embedder;
use cdpdocs_text::TantivyDocStore;
use cdpdocs_vector::FlatL2Index;

use crate::pipeline::IndexingPipeline;
use crate::retriever::HybridRetriever;

pub const VECTOR_SNAPSHOT: &str = "vectors.json";
pub const TEXT_DIR: &str = "text";

/// Process-wide search state: embedder, vector index, document store and the
/// pipeline that keeps the two in step. Build once, share as `Arc<SearchService>`.
pub struct SearchService {
    settings: Settings,
    index: Arc<FlatL2Index>,
    store: Arc<TantivyDocStore>,
    retriever: HybridRetriever<FlatL2Index, TantivyDocStore>,
    pipeline: IndexingPipeline<FlatL2Index, TantivyDocStore>,
    snapshot_path: Option<PathBuf>,
}

impl SearchService {
    /// Build with the embedder named in `settings`.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let embedder = build_embedder(&settings.embedder, settings.index.vector_dimension)?;
        Self::open(settings, embedder)
    }

    /// Fails before any request is served if the embedder, the configured
    /// dimension and any saved vector snapshot disagree. On disk, documents
    /// whose ids lie past the snapshot are dropped so every id still names the
    /// vector it was written with.
    pub fn open(settings: Settings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        settings.validate()?;
        let dim = settings.index.vector_dimension;
        if embedder.dim() != dim {
            return Err(Error::DimensionMismatch { expected: dim, actual: embedder.dim() });
        }

        let boosts = settings.search.boosts;
        let writer_memory = settings.text.writer_memory_bytes;
        let (index, store, snapshot_path) = match settings.index.data_path() {
            Some(dir) => {
                fs::create_dir_all(&dir)?;
                let snapshot = dir.join(VECTOR_SNAPSHOT);
                let index = FlatL2Index::open_or_new(&snapshot, dim)?;
                let store = TantivyDocStore::open(&dir.join(TEXT_DIR), boosts, writer_memory)?;
                // Documents written after the last snapshot lost their vectors;
                // their ids will be handed out again, possibly on another platform.
                let removed = store.remove_ids_from(index.len())?;
                if removed > 0 {
                    warn!(removed, vectors = index.len(), "document store was ahead of the vector snapshot");
                }
                info!(data_dir = %dir.display(), vectors = index.len(), "opened search state");
                (index, store, Some(snapshot))
            }
            None => {
                info!("no data_dir configured, search state is in memory");
                (FlatL2Index::new(dim)?, TantivyDocStore::in_memory(boosts, writer_memory), None)
            }
        };

        let index = Arc::new(index);
        let store = Arc::new(store);
        let retriever = HybridRetriever::new(Arc::clone(&embedder), Arc::clone(&index), Arc::clone(&store), settings.search.semantic_weight)?;
        let pipeline = IndexingPipeline::new(embedder, Arc::clone(&index), Arc::clone(&store));
        Ok(Self { settings, index, store, retriever, pipeline, snapshot_path })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &TantivyDocStore {
        &self.store
    }

    pub fn vector_count(&self) -> usize {
        self.index.len()
    }

    /// Search with the platform's configured weight and `top_k`.
    pub async fn search(&self, query: &str, platform: &str) -> Result<Vec<SearchResult>> {
        let top_k = self.settings.search.top_k_for(platform);
        self.search_top_k(query, platform, top_k).await
    }

    pub async fn search_top_k(&self, query: &str, platform: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let weight = self.settings.search.semantic_weight_for(platform);
        self.retriever.retrieve_weighted(query, platform, top_k, weight).await
    }

    pub async fn index_document(&self, chunk: DocumentChunk) -> Result<Position> {
        self.pipeline.index_document(chunk).await
    }

    pub async fn index_documents(&self, chunks: Vec<DocumentChunk>) -> Result<Vec<Position>> {
        self.pipeline.index_documents(chunks).await
    }

    /// Exact lookup; a miss is `NotFound`.
    pub fn get_document(&self, platform: &str, id: &str) -> Result<DocumentChunk> {
        self.store
            .get_by_id(platform, id)?
            .ok_or_else(|| Error::NotFound(format!("{}/{}", canonical_platform(platform), id)))
    }

    /// Write the vector snapshot. Documents are already durable on every put.
    /// No-op when running in memory.
    #[instrument(skip(self))]
    pub fn persist(&self) -> Result<()> {
        match &self.snapshot_path {
            Some(path) => self.index.save(path),
            None => Ok(()),
        }
    }

    pub fn shutdown(&self) -> Result<()> {
        self.persist()?;
        info!(vectors = self.index.len(), "search service shut down");
        Ok(())
    }
}

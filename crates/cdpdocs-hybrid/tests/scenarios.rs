use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cdpdocs_core::config::{Boosts, PlatformOverrides, Settings, MIN_WRITER_MEMORY_BYTES};
use cdpdocs_core::error::{Error, Result};
use cdpdocs_core::traits::{DocumentStore, Embedder, VectorIndexer};
use cdpdocs_core::types::DocumentChunk;
use cdpdocs_embed::HashEmbedder;
use cdpdocs_hybrid::{HybridRetriever, IndexingPipeline, SearchService};
use cdpdocs_text::TantivyDocStore;
use cdpdocs_vector::FlatL2Index;
use tempfile::TempDir;

const DIM: usize = 64;

/// Returns a fixed vector per known text and `fallback` for anything else.
struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
}

impl FixedEmbedder {
    fn new(fallback: Vec<f32>, known: &[(&str, Vec<f32>)]) -> Self {
        let vectors = known.iter().map(|(t, v)| (t.to_string(), v.clone())).collect();
        Self { vectors, fallback }
    }
}

impl Embedder for FixedEmbedder {
    fn dim(&self) -> usize {
        self.fallback.len()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectors.get(text).cloned().unwrap_or_else(|| self.fallback.clone()))
    }
}

struct OfflineEmbedder;

impl Embedder for OfflineEmbedder {
    fn dim(&self) -> usize {
        DIM
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::InvalidInput("model endpoint unreachable".into()))
    }
}

/// Keyword search and writes fail; id lookups always miss.
struct BrokenStore;

impl DocumentStore for BrokenStore {
    fn get_by_id(&self, _platform: &str, _id: &str) -> Result<Option<DocumentChunk>> {
        Ok(None)
    }

    fn query_by_text(&self, _platform: &str, _query: &str, _k: usize) -> Result<Vec<(DocumentChunk, f32)>> {
        Err(Error::upstream("keyword search", "connection refused"))
    }

    fn put(&self, _platform: &str, _id: &str, _document: &DocumentChunk) -> Result<()> {
        Err(Error::upstream("document write", "connection refused"))
    }
}

fn settings(dim: usize) -> Settings {
    let mut settings = Settings::default();
    settings.index.vector_dimension = dim;
    settings
}

fn in_memory_service() -> SearchService {
    SearchService::open(settings(DIM), Arc::new(HashEmbedder::new(DIM))).expect("service")
}

fn memory_store() -> Arc<TantivyDocStore> {
    Arc::new(TantivyDocStore::in_memory(Boosts::default(), MIN_WRITER_MEMORY_BYTES))
}

#[tokio::test]
async fn empty_corpus_returns_no_results() -> anyhow::Result<()> {
    let service = in_memory_service();
    let results = service.search_top_k("how do I add a source", "Segment", 3).await?;
    assert!(results.is_empty());
    Ok(())
}

#[tokio::test]
async fn single_document_is_found_once() -> anyhow::Result<()> {
    let service = in_memory_service();
    let content = "Go to Settings > Sources > Add Source";
    service.index_document(DocumentChunk::new("Segment", content)).await?;

    let results = service.search_top_k("add a source", "Segment", 3).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, content);
    assert_eq!(results[0].platform, "segment");
    assert!(results[0].score > 0.0);
    Ok(())
}

#[tokio::test]
async fn lexical_and_semantic_match_outranks_lexical_only() -> anyhow::Result<()> {
    let close = "track events with the analytics library";
    let far = "track page views in the browser";
    let embedder = FixedEmbedder::new(vec![0.0, 0.0], &[
        ("track", vec![1.0, 0.0]),
        (close, vec![1.0, 0.0]),
        (far, vec![-1.0, 0.0]),
    ]);
    let service = SearchService::open(settings(2), Arc::new(embedder))?;
    service.index_document(DocumentChunk::new("segment", far)).await?;
    service.index_document(DocumentChunk::new("segment", close)).await?;

    let results = service.search_top_k("track", "segment", 3).await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].content, close);
    assert_eq!(results[1].content, far);
    Ok(())
}

#[tokio::test]
async fn vectors_without_documents_are_skipped() -> anyhow::Result<()> {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let index = Arc::new(FlatL2Index::new(DIM)?);
    let store = memory_store();
    let pipeline = IndexingPipeline::new(Arc::clone(&embedder), Arc::clone(&index), Arc::clone(&store));
    let retriever = HybridRetriever::new(Arc::clone(&embedder), Arc::clone(&index), Arc::clone(&store), 0.5)?;

    index.add(embedder.embed("orphaned vector for a lost write")?)?;
    let position = pipeline.index_document(DocumentChunk::new("zeotap", "consent signals are stored per profile")).await?;
    assert_eq!(position.0, 1);

    let results = retriever.retrieve("orphaned vector", "zeotap", 5).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "consent signals are stored per profile");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_indexing_binds_each_document_to_its_own_id() -> anyhow::Result<()> {
    let service = Arc::new(in_memory_service());
    let handles: Vec<_> = (0..100)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let content = format!("concurrent document number {i}");
                let position = service.index_document(DocumentChunk::new("Segment", content.clone())).await?;
                Ok::<_, Error>((position, content))
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for joined in futures::future::join_all(handles).await {
        let (position, content) = joined??;
        assert!(seen.insert(position), "position {position} handed out twice");
        let stored = service.get_document("segment", &position.doc_id())?;
        assert_eq!(stored.content, content);
    }
    assert_eq!(seen.len(), 100);
    assert!(seen.iter().all(|p| p.0 < 100));
    assert_eq!(service.vector_count(), 100);
    assert_eq!(service.store().num_docs("segment")?, 100);
    Ok(())
}

#[tokio::test]
async fn embedder_failure_fails_the_whole_search() {
    let index = Arc::new(FlatL2Index::new(DIM).expect("index"));
    let retriever = HybridRetriever::new(Arc::new(OfflineEmbedder), index, memory_store(), 0.5).expect("retriever");
    let err = retriever.retrieve("add a source", "segment", 3).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)), "{err:?}");
}

#[tokio::test]
async fn keyword_failure_fails_the_whole_search() {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let index = Arc::new(FlatL2Index::new(DIM).expect("index"));
    let retriever = HybridRetriever::new(embedder, index, Arc::new(BrokenStore), 0.5).expect("retriever");
    let err = retriever.retrieve("add a source", "segment", 3).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)), "{err:?}");
}

#[tokio::test]
async fn failed_document_write_leaves_a_stale_vector() {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let index = Arc::new(FlatL2Index::new(DIM).expect("index"));
    let pipeline = IndexingPipeline::new(embedder, Arc::clone(&index), Arc::new(BrokenStore));

    let err = pipeline.index_document(DocumentChunk::new("segment", "audiences")).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
    assert_eq!(index.len(), 1);

    // The lock is released on the error path.
    let err = pipeline.index_document(DocumentChunk::new("segment", "audiences again")).await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn empty_documents_are_rejected() {
    let service = in_memory_service();
    let err = service.index_document(DocumentChunk::new("segment", "   ")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    let err = service.index_document(DocumentChunk::new(" ", "text")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(service.vector_count(), 0);
}

#[test]
fn embedder_dimension_is_checked_at_open() {
    let err = SearchService::open(settings(768), Arc::new(HashEmbedder::new(16))).err().expect("mismatch");
    assert!(matches!(err, Error::DimensionMismatch { expected: 768, actual: 16 }));
    assert!(err.is_config());
}

#[test]
fn out_of_range_weight_is_a_config_error() {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(DIM));
    let index = Arc::new(FlatL2Index::new(DIM).expect("index"));
    let err = HybridRetriever::new(embedder, index, memory_store(), 1.5).err().expect("invalid weight");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[tokio::test]
async fn platform_override_changes_the_fusion_weight() -> anyhow::Result<()> {
    let mut settings = settings(DIM);
    settings.search.platforms.insert("segment".into(), PlatformOverrides { semantic_weight: Some(0.0), top_k: None });
    let service = SearchService::open(settings, Arc::new(HashEmbedder::new(DIM)))?;
    service.index_document(DocumentChunk::new("segment", "sources send events")).await?;
    service.index_document(DocumentChunk::new("lytics", "audiences are built from profiles")).await?;

    // Keyword-only for segment: a query sharing no terms finds nothing.
    assert!(service.search("warehouse sync", "Segment").await?.is_empty());
    // Default weight elsewhere: the semantic path still contributes, and only
    // from the queried platform's partition.
    let lytics = service.search("warehouse sync", "lytics").await?;
    assert_eq!(lytics.len(), 1);
    assert_eq!(lytics[0].platform, "lytics");
    Ok(())
}

#[tokio::test]
async fn on_disk_state_survives_restart() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut settings = settings(DIM);
    settings.index.data_dir = Some(dir.path().to_string_lossy().to_string());

    {
        let service = SearchService::open(settings.clone(), Arc::new(HashEmbedder::new(DIM)))?;
        service.index_document(DocumentChunk::new("mparticle", "kits forward events to partners")).await?;
        service.index_document(DocumentChunk::new("mparticle", "identity strategies merge profiles")).await?;
        service.shutdown()?;
    }

    let service = SearchService::open(settings, Arc::new(HashEmbedder::new(DIM)))?;
    assert_eq!(service.vector_count(), 2);
    let results = service.search("identity strategies", "mparticle").await?;
    assert_eq!(results[0].content, "identity strategies merge profiles");
    let next = service.index_document(DocumentChunk::new("mparticle", "audience connections")).await?;
    assert_eq!(next.0, 2);
    Ok(())
}

#[tokio::test]
async fn missing_document_lookup_is_not_found() {
    let service = in_memory_service();
    let err = service.get_document("Segment", "42").unwrap_err();
    assert!(matches!(err, Error::NotFound(ref key) if key == "segment/42"));
}

#[tokio::test]
async fn documents_past_the_vector_snapshot_are_dropped_on_reopen() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut settings = settings(DIM);
    settings.index.data_dir = Some(dir.path().to_string_lossy().to_string());

    {
        // Dropped without persisting: the document is committed, its vector is not.
        let service = SearchService::open(settings.clone(), Arc::new(HashEmbedder::new(DIM)))?;
        service.index_document(DocumentChunk::new("lytics", "lytics audience segmentation guide")).await?;
    }

    let service = SearchService::open(settings, Arc::new(HashEmbedder::new(DIM)))?;
    assert_eq!(service.vector_count(), 0);
    assert_eq!(service.store().num_docs("lytics")?, 0);

    let position = service.index_document(DocumentChunk::new("segment", "warehouse sync schedule")).await?;
    assert_eq!(position.0, 0);
    assert!(service.search_top_k("warehouse sync schedule", "lytics", 3).await?.is_empty());
    let segment = service.search_top_k("warehouse sync schedule", "segment", 3).await?;
    assert_eq!(segment.len(), 1);
    assert_eq!(segment[0].content, "warehouse sync schedule");
    Ok(())
}

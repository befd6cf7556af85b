//! cdpdocs-hybrid
//!
//! Hybrid retrieval over the vector index and the keyword store: weighted
//! score fusion, the retriever that runs both sub-searches concurrently, the
//! indexing pipeline that keeps their ids aligned, and the owning service.

mod blocking;
pub mod fusion;
pub mod pipeline;
pub mod retriever;
pub mod service;

pub use fusion::fuse;
pub use pipeline::IndexingPipeline;
pub use retriever::HybridRetriever;
pub use service::SearchService;

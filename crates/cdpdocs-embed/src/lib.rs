//! cdpdocs-embed
//!
//! Embedding backends behind the `Embedder` trait: a deterministic hashing
//! embedder for development and tests, and (feature `model`) BGE-M3 via candle.

use std::sync::Arc;

use cdpdocs_core::config::{EmbedderKind, EmbedderSettings};
use cdpdocs_core::error::{Error, Result};
use cdpdocs_core::traits::Embedder;

pub mod hash;
pub use hash::HashEmbedder;

#[cfg(feature = "model")]
mod device;
#[cfg(feature = "model")]
pub mod model;
#[cfg(feature = "model")]
pub mod pool;
#[cfg(feature = "model")]
mod tokenize;

#[cfg(feature = "model")]
pub use model::ModelEmbedder;
#[cfg(feature = "model")]
pub use pool::masked_mean_l2;

/// Build the embedder named by `settings`. `dim` sizes the hashing embedder;
/// model embedders report their own dimension and are checked by the caller.
pub fn build_embedder(settings: &EmbedderSettings, dim: usize) -> Result<Arc<dyn Embedder>> {
    match settings.kind {
        EmbedderKind::Hash => {
            tracing::info!(dim, "using hash embedder");
            Ok(Arc::new(HashEmbedder::new(dim)))
        }
        EmbedderKind::Model => load_model(settings),
    }
}

#[cfg(feature = "model")]
fn load_model(settings: &EmbedderSettings) -> Result<Arc<dyn Embedder>> {
    let dir = model::resolve_model_dir(settings.model_dir.as_deref()).map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let model = ModelEmbedder::load(&dir).map_err(|e| Error::upstream("loading embedding model", e))?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "model"))]
fn load_model(_settings: &EmbedderSettings) -> Result<Arc<dyn Embedder>> {
    Err(Error::InvalidConfig("embedder.kind = \"model\" requires building with the `model` feature".into()))
}

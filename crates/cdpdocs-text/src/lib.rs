//! cdpdocs-text
//!
//! Keyword side of the search: a Tantivy index per platform behind the
//! `DocumentStore` trait. Documents are addressed by the id the vector index
//! handed out, so the store doubles as the id → chunk lookup for semantic hits.

pub mod tantivy_utils;
mod query;
pub mod store;

pub use store::TantivyDocStore;

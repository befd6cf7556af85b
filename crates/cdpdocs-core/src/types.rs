//! Domain types shared by the text, vector and hybrid engines.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_DOC_TYPE: &str = "general";

fn default_doc_type() -> String {
    DEFAULT_DOC_TYPE.to_string()
}

/// A unit of indexed documentation.
///
/// - `content`: the text payload; must be non-empty to be indexed
/// - `platform`: which CDP product the chunk describes; selects the store partition
/// - `doc_type`: category tag, `"general"` when not supplied
/// - `section`/`title`/`url`: optional provenance, `title` and `section` are boosted in keyword search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    pub platform: String,
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl DocumentChunk {
    pub fn new(platform: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            platform: platform.into(),
            doc_type: default_doc_type(),
            section: None,
            title: None,
            url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = doc_type.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One retrieved match.
///
/// `score` is engine-specific before fusion (similarity for the vector path,
/// BM25 for the keyword path) and the weighted sum after it. Higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub platform: String,
    pub score: f32,
    pub doc_type: String,
    pub section: Option<String>,
}

impl SearchResult {
    pub fn from_chunk(chunk: DocumentChunk, score: f32) -> Self {
        Self {
            content: chunk.content,
            platform: chunk.platform,
            score,
            doc_type: chunk.doc_type,
            section: chunk.section,
        }
    }
}

/// Insertion order of a vector in the index; its decimal form keys the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position(pub usize);

impl Position {
    pub fn doc_id(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical partition name: "  mParticle " and "MPARTICLE" both map to "mparticle".
pub fn canonical_platform(name: &str) -> String {
    name.trim().to_lowercase()
}

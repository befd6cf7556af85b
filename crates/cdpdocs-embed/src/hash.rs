use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use cdpdocs_core::error::Result;
use cdpdocs_core::traits::Embedder;

/// Feature-hashing embedder: every lowercased alphanumeric token is hashed into
/// one of `dim` buckets with a hash-derived sign, then the vector is L2-normalized.
///
/// Texts sharing vocabulary land close together, which is all the hybrid
/// retriever needs for development and tests. Deterministic across runs.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

pub(crate) fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase)
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0f32; self.dim];
        if self.dim == 0 {
            return Ok(v);
        }
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            let sign = if (h >> 63) & 1 == 1 { -1.0 } else { 1.0 };
            v[idx] += sign;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_split_on_punctuation_and_lowercase() {
        let t: Vec<String> = tokens("Settings > Sources > Add-Source!").collect();
        assert_eq!(t, vec!["settings", "sources", "add", "source"]);
    }

    #[test]
    fn empty_text_is_the_zero_vector() {
        let v = HashEmbedder::new(16).embed("  ...  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}

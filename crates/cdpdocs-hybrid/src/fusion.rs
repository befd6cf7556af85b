use std::collections::HashMap;

use cdpdocs_core::types::SearchResult;

/// Merge semantic and keyword hits into one ranking keyed by `content`.
///
/// Semantic scores are weighted by `semantic_weight`, keyword scores by
/// `1 - semantic_weight`; hits sharing content accumulate into the entry that
/// was inserted first, which also supplies the metadata. The sort is stable:
/// equal scores keep insertion order, semantic entries first.
///
/// A path weighted exactly zero is skipped rather than contributing
/// zero-scored entries. With `w = 1` the result is therefore exactly the
/// semantic list (no keyword-only tail at score 0), and with `w = 0` exactly
/// the keyword list.
pub fn fuse(semantic: Vec<SearchResult>, keyword: Vec<SearchResult>, semantic_weight: f32) -> Vec<SearchResult> {
    let keyword_weight = 1.0 - semantic_weight;
    let mut fused: Vec<SearchResult> = Vec::with_capacity(semantic.len() + keyword.len());
    let mut by_content: HashMap<String, usize> = HashMap::new();

    let weighted = [(semantic, semantic_weight), (keyword, keyword_weight)];
    for (hits, weight) in weighted {
        if weight <= 0.0 {
            continue;
        }
        for hit in hits {
            let contribution = hit.score * weight;
            match by_content.get(&hit.content) {
                Some(&slot) => fused[slot].score += contribution,
                None => {
                    by_content.insert(hit.content.clone(), fused.len());
                    fused.push(SearchResult { score: contribution, ..hit });
                }
            }
        }
    }

    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused
}

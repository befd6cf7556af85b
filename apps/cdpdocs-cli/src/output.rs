//! Rendering of search results for the terminal and for scripts.

use cdpdocs_core::types::SearchResult;
use serde::Serialize;

const SNIPPET_MAX_LEN: usize = 240;

#[derive(Serialize)]
struct JsonOutput<'a> {
    query: &'a str,
    platform: &'a str,
    results: &'a [SearchResult],
}

pub fn format_json(query: &str, platform: &str, results: &[SearchResult]) -> String {
    let output = JsonOutput { query, platform, results };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_human(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No results for \"{query}\"");
    }
    let mut out = format!("{} result(s) for \"{query}\"\n", results.len());
    for (i, r) in results.iter().enumerate() {
        let section = r.section.as_deref().unwrap_or("-");
        out.push_str(&format!("\n  {}. score={:.4}  type={}  section={}\n", i + 1, r.score, r.doc_type, section));
        out.push_str(&format!("     {}\n", truncate(&r.content, SNIPPET_MAX_LEN)));
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

use cdpdocs_core::config::{Boosts, MIN_WRITER_MEMORY_BYTES};
use cdpdocs_core::traits::DocumentStore;
use cdpdocs_core::types::DocumentChunk;
use cdpdocs_text::TantivyDocStore;
use tempfile::TempDir;

fn store() -> TantivyDocStore {
    TantivyDocStore::in_memory(Boosts::default(), MIN_WRITER_MEMORY_BYTES)
}

fn chunk(platform: &str, content: &str) -> DocumentChunk {
    DocumentChunk::new(platform, content)
}

#[test]
fn put_then_get_returns_the_stored_chunk() -> anyhow::Result<()> {
    let store = store();
    let doc = chunk("segment", "Sources send data into Segment.")
        .with_title("Sources")
        .with_section("Overview")
        .with_doc_type("guide")
        .with_url("https://example.com/sources");
    store.put("segment", "0", &doc)?;

    let got = store.get_by_id("segment", "0")?.expect("stored chunk");
    assert_eq!(got, doc);
    assert!(store.get_by_id("segment", "1")?.is_none());
    assert!(store.get_by_id("mparticle", "0")?.is_none());
    Ok(())
}

#[test]
fn platforms_are_isolated() -> anyhow::Result<()> {
    let store = store();
    store.put("segment", "0", &chunk("segment", "create a source in segment"))?;
    store.put("lytics", "1", &chunk("lytics", "create a source in lytics"))?;

    let hits = store.query_by_text("segment", "create source", 10)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0.platform, "segment");
    assert!(store.query_by_text("zeotap", "create source", 10)?.is_empty());
    assert_eq!(store.platforms(), vec!["lytics".to_string(), "segment".to_string()]);
    Ok(())
}

#[test]
fn platform_names_are_case_insensitive() -> anyhow::Result<()> {
    let store = store();
    store.put("Segment ", "0", &chunk("segment", "tracking plans validate events"))?;
    assert!(store.get_by_id("SEGMENT", "0")?.is_some());
    assert_eq!(store.query_by_text("segment", "tracking plans", 5)?.len(), 1);
    assert_eq!(store.num_docs("segment")?, 1);
    Ok(())
}

#[test]
fn every_content_term_is_required() -> anyhow::Result<()> {
    let store = store();
    store.put("segment", "0", &chunk("segment", "add a source to your workspace"))?;
    store.put("segment", "1", &chunk("segment", "add a destination to your workspace"))?;

    let hits = store.query_by_text("segment", "How do I add a source?", 10)?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0.content, "add a source to your workspace");
    Ok(())
}

#[test]
fn title_match_outranks_plain_content_match() -> anyhow::Result<()> {
    let store = store();
    let body = "audiences are built from profile traits";
    store.put("lytics", "0", &chunk("lytics", body).with_title("Profiles"))?;
    store.put("lytics", "1", &chunk("lytics", body).with_title("Build audiences"))?;

    let hits = store.query_by_text("lytics", "audiences", 10)?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0.title.as_deref(), Some("Build audiences"));
    assert!(hits[0].1 > hits[1].1);
    Ok(())
}

#[test]
fn putting_the_same_id_replaces_the_document() -> anyhow::Result<()> {
    let store = store();
    store.put("zeotap", "7", &chunk("zeotap", "old text about identity"))?;
    store.put("zeotap", "7", &chunk("zeotap", "new text about consent"))?;

    assert_eq!(store.num_docs("zeotap")?, 1);
    assert_eq!(store.get_by_id("zeotap", "7")?.map(|c| c.content).as_deref(), Some("new text about consent"));
    assert!(store.query_by_text("zeotap", "identity", 5)?.is_empty());
    Ok(())
}

#[test]
fn results_are_capped_and_zero_k_is_empty() -> anyhow::Result<()> {
    let store = store();
    for i in 0..5 {
        store.put("mparticle", &i.to_string(), &chunk("mparticle", &format!("event forwarding rule number {i}")))?;
    }
    let hits = store.query_by_text("mparticle", "event forwarding", 3)?;
    assert_eq!(hits.len(), 3);
    assert!(hits.windows(2).all(|w| w[0].1 >= w[1].1));
    assert!(store.query_by_text("mparticle", "event forwarding", 0)?.is_empty());
    Ok(())
}

#[test]
fn stop_word_only_query_matches_nothing() -> anyhow::Result<()> {
    let store = store();
    store.put("segment", "0", &chunk("segment", "how do I do this"))?;
    assert!(store.query_by_text("segment", "how do I", 5)?.is_empty());
    assert!(store.query_by_text("segment", "", 5)?.is_empty());
    Ok(())
}

#[test]
fn on_disk_store_survives_reopen() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    {
        let store = TantivyDocStore::open(dir.path(), Boosts::default(), MIN_WRITER_MEMORY_BYTES)?;
        store.put("segment", "0", &chunk("segment", "warehouses sync on a schedule").with_title("Warehouses"))?;
    }
    assert!(dir.path().join("segment").is_dir());

    let reopened = TantivyDocStore::open(dir.path(), Boosts::default(), MIN_WRITER_MEMORY_BYTES)?;
    assert_eq!(reopened.platforms(), vec!["segment".to_string()]);
    let got = reopened.get_by_id("segment", "0")?.expect("persisted chunk");
    assert_eq!(got.title.as_deref(), Some("Warehouses"));
    assert_eq!(reopened.query_by_text("segment", "warehouses", 5)?.len(), 1);
    Ok(())
}

#[test]
fn ids_from_a_position_onward_are_removed_everywhere() -> anyhow::Result<()> {
    let store = store();
    store.put("segment", "0", &chunk("segment", "sources"))?;
    store.put("lytics", "1", &chunk("lytics", "audiences"))?;
    store.put("segment", "2", &chunk("segment", "destinations"))?;
    store.put("zeotap", "12", &chunk("zeotap", "consent"))?;

    assert_eq!(store.remove_ids_from(1)?, 3);
    assert!(store.get_by_id("segment", "0")?.is_some());
    assert!(store.get_by_id("lytics", "1")?.is_none());
    assert!(store.get_by_id("segment", "2")?.is_none());
    assert!(store.get_by_id("zeotap", "12")?.is_none());
    assert_eq!(store.remove_ids_from(1)?, 0);
    Ok(())
}

fn ranked_by_field(boosts: Boosts) -> anyhow::Result<Vec<(String, f32)>> {
    let store = TantivyDocStore::in_memory(boosts, MIN_WRITER_MEMORY_BYTES);
    let body = "the audience builder creates segments from traits";
    store.put("lytics", "0", &chunk("lytics", body).with_doc_type("content"))?;
    store.put("lytics", "1", &chunk("lytics", body).with_doc_type("section").with_section("Audience builder"))?;
    store.put("lytics", "2", &chunk("lytics", body).with_doc_type("title").with_title("Audience builder"))?;
    Ok(store
        .query_by_text("lytics", "audience builder", 10)?
        .into_iter()
        .map(|(c, score)| (c.doc_type, score))
        .collect())
}

fn order(ranked: &[(String, f32)]) -> Vec<&str> {
    ranked.iter().map(|(t, _)| t.as_str()).collect()
}

#[test]
fn title_beats_section_beats_content_with_default_boosts() -> anyhow::Result<()> {
    let ranked = ranked_by_field(Boosts::default())?;
    assert_eq!(order(&ranked), vec!["title", "section", "content"]);
    assert!(ranked[0].1 > ranked[1].1 && ranked[1].1 > ranked[2].1, "{ranked:?}");
    Ok(())
}

#[test]
fn raising_the_section_boost_reorders_results() -> anyhow::Result<()> {
    let ranked = ranked_by_field(Boosts { title: 2.0, section: 5.0, content: 1.0 })?;
    assert_eq!(order(&ranked), vec!["section", "title", "content"]);
    assert!(ranked[0].1 > ranked[1].1 && ranked[1].1 > ranked[2].1, "{ranked:?}");
    Ok(())
}

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{AllQuery, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info, warn};

use cdpdocs_core::config::{Boosts, MIN_WRITER_MEMORY_BYTES};
use cdpdocs_core::error::{Error, Result};
use cdpdocs_core::traits::DocumentStore;
use cdpdocs_core::types::{canonical_platform, DocumentChunk, DEFAULT_DOC_TYPE};

use crate::query::build_keyword_query;
use crate::tantivy_utils::{build_schema, register_tokenizer, Fields};

trait StoreResultExt<T> {
	fn store_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> StoreResultExt<T> for std::result::Result<T, E> {
	fn store_err(self, context: &str) -> Result<T> {
		self.map_err(|e| Error::upstream(context, e))
	}
}

/// One platform's index. Reads go through `reader`, which is reloaded after
/// every commit so a finished `put` is immediately visible.
struct Partition {
	index: Index,
	reader: IndexReader,
	writer: Mutex<IndexWriter>,
	fields: Fields,
}

impl Partition {
	fn create(dir: Option<&Path>, writer_memory_bytes: usize) -> Result<Self> {
		let schema = build_schema();
		let index = match dir {
			Some(dir) => {
				fs::create_dir_all(dir)?;
				let mmap = MmapDirectory::open(dir).store_err("opening index directory")?;
				Index::open_or_create(mmap, schema).store_err("opening index")?
			}
			None => Index::create_in_ram(schema),
		};
		register_tokenizer(&index);
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().store_err("opening reader")?;
		let writer = index.writer_with_num_threads(1, writer_memory_bytes).store_err("opening writer")?;
		let fields = Fields::from_schema(&index.schema()).store_err("schema")?;
		Ok(Self { index, reader, writer: Mutex::new(writer), fields })
	}

	fn to_document(&self, platform: &str, id: &str, chunk: &DocumentChunk) -> TantivyDocument {
		let f = &self.fields;
		let mut doc = TantivyDocument::default();
		doc.add_text(f.id, id);
		doc.add_text(f.platform, platform);
		doc.add_text(f.content, &chunk.content);
		doc.add_text(f.doc_type, &chunk.doc_type);
		if let Some(title) = &chunk.title { doc.add_text(f.title, title); }
		if let Some(section) = &chunk.section { doc.add_text(f.section, section); }
		if let Some(url) = &chunk.url { doc.add_text(f.url, url); }
		doc
	}

	fn to_chunk(&self, doc: &TantivyDocument) -> DocumentChunk {
		let f = &self.fields;
		let text = |field| doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string);
		DocumentChunk {
			content: text(f.content).unwrap_or_default(),
			platform: text(f.platform).unwrap_or_default(),
			doc_type: text(f.doc_type).unwrap_or_else(|| DEFAULT_DOC_TYPE.to_string()),
			section: text(f.section),
			title: text(f.title),
			url: text(f.url),
		}
	}
}

/// Tantivy-backed [`DocumentStore`] with one index per platform.
///
/// In memory by default; [`TantivyDocStore::open`] keeps each partition under
/// `<root>/<platform>` and reopens existing ones.
pub struct TantivyDocStore {
	root: Option<PathBuf>,
	boosts: Boosts,
	writer_memory_bytes: usize,
	partitions: RwLock<HashMap<String, Arc<Partition>>>,
}

impl TantivyDocStore {
	pub fn in_memory(boosts: Boosts, writer_memory_bytes: usize) -> Self {
		Self {
			root: None,
			boosts,
			writer_memory_bytes: writer_memory_bytes.max(MIN_WRITER_MEMORY_BYTES),
			partitions: RwLock::new(HashMap::new()),
		}
	}

	pub fn open(root: &Path, boosts: Boosts, writer_memory_bytes: usize) -> Result<Self> {
		fs::create_dir_all(root)?;
		let store = Self { root: Some(root.to_path_buf()), ..Self::in_memory(boosts, writer_memory_bytes) };
		let mut opened = HashMap::new();
		for entry in fs::read_dir(root)? {
			let entry = entry?;
			if !entry.file_type()?.is_dir() { continue; }
			let name = entry.file_name().to_string_lossy().to_string();
			opened.insert(name, Arc::new(Partition::create(Some(&entry.path()), store.writer_memory_bytes)?));
		}
		info!(root = %root.display(), partitions = opened.len(), "opened document store");
		*store.partitions.write().map_err(|_| poisoned())? = opened;
		Ok(store)
	}

	/// Platforms that currently hold a partition, sorted.
	pub fn platforms(&self) -> Vec<String> {
		let mut names: Vec<String> = self.partitions.read().map(|p| p.keys().cloned().collect()).unwrap_or_default();
		names.sort();
		names
	}

	pub fn num_docs(&self, platform: &str) -> Result<u64> {
		Ok(self.existing(platform)?.map(|p| p.reader.searcher().num_docs()).unwrap_or(0))
	}

	/// Delete every document whose id is a position at or past `first`, in
	/// every partition. Returns the number removed.
	pub fn remove_ids_from(&self, first: usize) -> Result<u64> {
		let partitions: Vec<(String, Arc<Partition>)> =
			self.partitions.read().map_err(|_| poisoned())?.iter().map(|(k, p)| (k.clone(), p.clone())).collect();
		let mut removed = 0u64;
		for (platform, part) in partitions {
			let searcher = part.reader.searcher();
			let mut stale = Vec::new();
			for addr in searcher.search(&AllQuery, &DocSetCollector).store_err("scanning ids")? {
				let doc: TantivyDocument = searcher.doc(addr).store_err("loading document")?;
				let Some(id) = doc.get_first(part.fields.id).and_then(|v| v.as_str()) else { continue };
				if matches!(id.parse::<usize>(), Ok(n) if n >= first) {
					stale.push(id.to_string());
				}
			}
			if stale.is_empty() { continue; }

			let mut writer = part.writer.lock().map_err(|_| poisoned())?;
			for id in &stale {
				writer.delete_term(Term::from_field_text(part.fields.id, id));
			}
			writer.commit().store_err("committing")?;
			part.reader.reload().store_err("reloading reader")?;
			warn!(%platform, count = stale.len(), first, "removed documents without vectors");
			removed += stale.len() as u64;
		}
		Ok(removed)
	}

	fn existing(&self, platform: &str) -> Result<Option<Arc<Partition>>> {
		let key = partition_key(platform);
		Ok(self.partitions.read().map_err(|_| poisoned())?.get(&key).cloned())
	}

	fn partition_for_write(&self, platform: &str) -> Result<Arc<Partition>> {
		if let Some(p) = self.existing(platform)? {
			return Ok(p);
		}
		let key = partition_key(platform);
		let mut partitions = self.partitions.write().map_err(|_| poisoned())?;
		if let Some(p) = partitions.get(&key) {
			return Ok(p.clone());
		}
		let dir = self.root.as_ref().map(|r| r.join(&key));
		let partition = Arc::new(Partition::create(dir.as_deref(), self.writer_memory_bytes)?);
		debug!(platform = %key, "created partition");
		partitions.insert(key, partition.clone());
		Ok(partition)
	}
}

fn poisoned() -> Error {
	Error::Upstream("document store lock poisoned".into())
}

/// Canonical platform name made safe for use as a directory name.
fn partition_key(platform: &str) -> String {
	canonical_platform(platform)
		.chars()
		.map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
		.collect()
}

impl DocumentStore for TantivyDocStore {
	fn get_by_id(&self, platform: &str, id: &str) -> Result<Option<DocumentChunk>> {
		let Some(part) = self.existing(platform)? else { return Ok(None) };
		let searcher = part.reader.searcher();
		let query = TermQuery::new(Term::from_field_text(part.fields.id, id), IndexRecordOption::Basic);
		let top = searcher.search(&query, &TopDocs::with_limit(1)).store_err("id lookup")?;
		match top.first() {
			Some((_, addr)) => {
				let doc: TantivyDocument = searcher.doc(*addr).store_err("loading document")?;
				Ok(Some(part.to_chunk(&doc)))
			}
			None => Ok(None),
		}
	}

	fn query_by_text(&self, platform: &str, query: &str, k: usize) -> Result<Vec<(DocumentChunk, f32)>> {
		if k == 0 { return Ok(Vec::new()); }
		let Some(part) = self.existing(platform)? else { return Ok(Vec::new()) };
		let Some(q) = build_keyword_query(&part.index, &part.fields, query, &self.boosts) else { return Ok(Vec::new()) };
		let searcher = part.reader.searcher();
		let top_docs = searcher.search(&q, &TopDocs::with_limit(k)).store_err("keyword search")?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).store_err("loading document")?;
			hits.push((part.to_chunk(&doc), score));
		}
		Ok(hits)
	}

	fn put(&self, platform: &str, id: &str, document: &DocumentChunk) -> Result<()> {
		let platform = canonical_platform(platform);
		let part = self.partition_for_write(&platform)?;
		let doc = part.to_document(&platform, id, document);
		let mut writer = part.writer.lock().map_err(|_| poisoned())?;
		writer.delete_term(Term::from_field_text(part.fields.id, id));
		writer.add_document(doc).store_err("adding document")?;
		writer.commit().store_err("committing")?;
		part.reader.reload().store_err("reloading reader")?;
		Ok(())
	}
}

use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const TOKENIZER: &str = "text_with_stopwords";

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	schema_builder.add_text_field("id", STRING | STORED);
	schema_builder.add_text_field("platform", STRING | STORED);
	schema_builder.add_text_field("content", text_options.clone());
	schema_builder.add_text_field("title", text_options.clone());
	schema_builder.add_text_field("section", text_options);
	schema_builder.add_text_field("doc_type", STRING | STORED);
	schema_builder.add_text_field("url", STORED);
	schema_builder.build()
}

/// English function words plus the pronouns support questions open with
/// ("how do I", "can we").
const STOP_WORDS: &[&str] = &[
	"a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "could", "did", "do", "does", "for", "from",
	"had", "has", "have", "having", "he", "how", "i", "if", "in", "is", "it", "its", "may", "me", "might", "must",
	"my", "not", "of", "on", "or", "our", "shall", "should", "so", "than", "that", "the", "their", "them", "then",
	"there", "these", "they", "this", "to", "was", "we", "what", "when", "where", "which", "who", "whom", "whose",
	"why", "will", "with", "would", "you", "your",
];

/// Register the analyzer every text field uses: simple word split, lowercase,
/// stop words removed. Must run on each opened index before reading or writing.
pub fn register_tokenizer(index: &Index) {
	let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|w| (*w).to_string())))
		.build();
	index.tokenizers().register(TOKENIZER, analyzer);
}

/// Resolved handles for every schema field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fields {
	pub id: Field,
	pub platform: Field,
	pub content: Field,
	pub title: Field,
	pub section: Field,
	pub doc_type: Field,
	pub url: Field,
}

impl Fields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field("id")?,
			platform: schema.get_field("platform")?,
			content: schema.get_field("content")?,
			title: schema.get_field("title")?,
			section: schema.get_field("section")?,
			doc_type: schema.get_field("doc_type")?,
			url: schema.get_field("url")?,
		})
	}
}

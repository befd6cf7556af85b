use tantivy::query::{BooleanQuery, BoostQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

use cdpdocs_core::config::Boosts;

use crate::tantivy_utils::{Fields, TOKENIZER};

/// Analyzed query terms with their token positions (stop words leave gaps).
pub(crate) fn analyze(index: &Index, text: &str) -> Vec<(usize, String)> {
	let Some(mut analyzer) = index.tokenizers().get(TOKENIZER) else { return Vec::new() };
	let mut stream = analyzer.token_stream(text);
	let mut terms = Vec::new();
	while stream.advance() {
		let token = stream.token();
		terms.push((token.position, token.text.clone()));
	}
	terms
}

/// Every content term is required; phrase matches on `title` and `section`
/// only add score. Returns `None` when nothing survives analysis.
pub(crate) fn build_keyword_query(index: &Index, fields: &Fields, text: &str, boosts: &Boosts) -> Option<Box<dyn Query>> {
	let terms = analyze(index, text);
	if terms.is_empty() {
		return None;
	}

	let mut unique: Vec<&str> = terms.iter().map(|(_, t)| t.as_str()).collect();
	unique.sort_unstable();
	unique.dedup();
	let content_clauses: Vec<(Occur, Box<dyn Query>)> = unique
		.into_iter()
		.map(|t| {
			let q: Box<dyn Query> = Box::new(TermQuery::new(Term::from_field_text(fields.content, t), IndexRecordOption::WithFreqs));
			(Occur::Must, q)
		})
		.collect();
	let content: Box<dyn Query> = Box::new(BooleanQuery::new(content_clauses));

	let clauses: Vec<(Occur, Box<dyn Query>)> = vec![
		(Occur::Must, Box::new(BoostQuery::new(content, boosts.content)) as Box<dyn Query>),
		(Occur::Should, Box::new(BoostQuery::new(phrase(fields.title, &terms), boosts.title)) as Box<dyn Query>),
		(Occur::Should, Box::new(BoostQuery::new(phrase(fields.section, &terms), boosts.section)) as Box<dyn Query>),
	];
	Some(Box::new(BooleanQuery::new(clauses)))
}

fn phrase(field: Field, terms: &[(usize, String)]) -> Box<dyn Query> {
	if let [(_, only)] = terms {
		return Box::new(TermQuery::new(Term::from_field_text(field, only), IndexRecordOption::WithFreqs));
	}
	let base = terms.first().map(|(p, _)| *p).unwrap_or(0);
	let offsets = terms.iter().map(|(p, t)| (p - base, Term::from_field_text(field, t))).collect();
	Box::new(PhraseQuery::new_with_offset(offsets))
}

use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::Value;
use tantivy::{doc, Index, TantivyDocument};
use tracing::debug;

use docsearch_core::traits::LexicalMatcher;
use docsearch_core::types::Document;
use docsearch_core::Error;

use crate::tantivy_utils::{build_schema, register_tokenizer, F_CONTENT, F_IDX, F_TAGS, F_TITLE};

const WRITER_HEAP_BYTES: usize = 20_000_000;

/// Full-text matching with tantivy. The candidate set differs per query
/// (structured filters run first), so each call indexes it into RAM and
/// ranks by BM25.
#[derive(Debug, Default, Clone, Copy)]
pub struct TantivyMatcher;

impl TantivyMatcher {
	fn search(&self, query: &str, candidates: &[Document]) -> Result<Vec<usize>> {
		let schema = build_schema();
		let index = Index::create_in_ram(schema.clone());
		register_tokenizer(&index);
		let idx_field = schema.get_field(F_IDX)?;
		let title_field = schema.get_field(F_TITLE)?;
		let content_field = schema.get_field(F_CONTENT)?;
		let tags_field = schema.get_field(F_TAGS)?;

		let mut writer = index.writer_with_num_threads::<TantivyDocument>(1, WRITER_HEAP_BYTES)?;
		for (i, d) in candidates.iter().enumerate() {
			writer.add_document(doc!(
				idx_field => i as u64,
				title_field => d.title.as_str(),
				content_field => d.content.as_str(),
				tags_field => d.tags.join(" "),
			))?;
		}
		writer.commit()?;

		let searcher = index.reader()?.searcher();
		let parser = QueryParser::for_index(&index, vec![title_field, content_field, tags_field]);
		let (q, errors) = parser.parse_query_lenient(query);
		if !errors.is_empty() { debug!(?errors, "lenient query parse dropped terms"); }
		let top_docs = searcher.search(&q, &TopDocs::with_limit(candidates.len()))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (_score, addr) in top_docs {
			let stored: TantivyDocument = searcher.doc(addr)?;
			if let Some(i) = stored.get_first(idx_field).and_then(|v| v.as_u64()) { hits.push(i as usize); }
		}
		Ok(hits)
	}
}

impl LexicalMatcher for TantivyMatcher {
	fn find_matches(&self, query: &str, candidates: &[Document]) -> docsearch_core::Result<Vec<usize>> {
		if candidates.is_empty() || query.trim().is_empty() { return Ok(Vec::new()); }
		self.search(query, candidates).map_err(|e| Error::Operation(format!("tantivy: {e:#}")))
	}
}

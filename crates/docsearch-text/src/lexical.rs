use docsearch_core::traits::LexicalMatcher;
use docsearch_core::types::Document;
use docsearch_core::Result;

/// Case-insensitive substring match on title, content, or any tag.
/// Hits come back in candidate order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringMatcher;

impl SubstringMatcher {
    fn is_match(needle: &str, doc: &Document) -> bool {
        doc.title.to_lowercase().contains(needle)
            || doc.content.to_lowercase().contains(needle)
            || doc.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }
}

impl LexicalMatcher for SubstringMatcher {
    fn find_matches(&self, query: &str, candidates: &[Document]) -> Result<Vec<usize>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() { return Ok(Vec::new()); }
        Ok(candidates
            .iter()
            .enumerate()
            .filter(|(_, doc)| Self::is_match(&needle, doc))
            .map(|(i, _)| i)
            .collect())
    }
}

//! docsearch-hybrid
//!
//! `HybridRanker` merges the semantic pass (vector similarity over the
//! filtered candidates) with a lexical pass into one deduplicated list.
//! `service` puts upload/search/categories on top of it.
pub mod service;

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use docsearch_core::config::{LexicalMode, SearchSettings};
use docsearch_core::traits::{DocumentStore, Embedder, LexicalMatcher};
use docsearch_core::types::{Filters, MatchType, ScoredCandidate};
use docsearch_core::{Error, Result};
use docsearch_text::{QueryEnhancer, SubstringMatcher, TantivyMatcher};
use docsearch_vector::semantic_pass;

pub use service::{DocumentService, SearchRequest, UploadRequest, UploadedFile};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerConfig {
    /// Semantic cut-off while a lexical matcher is configured.
    pub semantic_threshold: f32,
    /// Semantic cut-off without a lexical matcher.
    pub semantic_only_threshold: f32,
    pub text_similarity: f32,
}

impl Default for RankerConfig {
    fn default() -> Self { Self { semantic_threshold: 0.5, semantic_only_threshold: 0.3, text_similarity: 0.5 } }
}

impl From<&SearchSettings> for RankerConfig {
    fn from(s: &SearchSettings) -> Self {
        Self {
            semantic_threshold: s.semantic_threshold,
            semantic_only_threshold: s.semantic_only_threshold,
            text_similarity: s.text_similarity,
        }
    }
}

/// Ranked hits plus the query text that was actually embedded.
#[derive(Debug, Clone)]
pub struct Ranking {
    pub query: String,
    pub hits: Vec<ScoredCandidate>,
}

pub struct HybridRanker {
    store: Arc<dyn DocumentStore>,
    embedder: Arc<dyn Embedder>,
    matcher: Option<Arc<dyn LexicalMatcher>>,
    enhancer: QueryEnhancer,
    config: RankerConfig,
}

impl HybridRanker {
    /// Substring lexical matching and default thresholds.
    pub fn new(store: Arc<dyn DocumentStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            matcher: Some(Arc::new(SubstringMatcher)),
            enhancer: QueryEnhancer::default(),
            config: RankerConfig::default(),
        }
    }

    pub fn from_settings(store: Arc<dyn DocumentStore>, embedder: Arc<dyn Embedder>, settings: &SearchSettings) -> Self {
        let matcher: Option<Arc<dyn LexicalMatcher>> = match settings.lexical {
            LexicalMode::Substring => Some(Arc::new(SubstringMatcher)),
            LexicalMode::Tantivy => Some(Arc::new(TantivyMatcher)),
            LexicalMode::Off => None,
        };
        Self::new(store, embedder).with_matcher(matcher).with_config(settings.into())
    }

    /// `None` disables the lexical pass.
    pub fn with_matcher(mut self, matcher: Option<Arc<dyn LexicalMatcher>>) -> Self { self.matcher = matcher; self }

    pub fn with_config(mut self, config: RankerConfig) -> Self { self.config = config; self }

    pub fn enhance(&self, query: &str) -> String { self.enhancer.enhance(query) }

    pub async fn rank(&self, query: &str, filters: &Filters, limit: usize) -> Result<Vec<ScoredCandidate>> {
        Ok(self.rank_with_query(query, filters, limit).await?.hits)
    }

    pub async fn rank_with_query(&self, query: &str, filters: &Filters, limit: usize) -> Result<Ranking> {
        if query.trim().is_empty() {
            if filters.is_empty() { return Err(Error::invalid("search query or filters required")); }
            let mut hits: Vec<ScoredCandidate> = self
                .store
                .find_active(filters)
                .await?
                .into_iter()
                .map(|d| ScoredCandidate::new(d, 1.0, MatchType::Filter))
                .collect();
            hits.truncate(limit);
            return Ok(Ranking { query: String::new(), hits });
        }

        let enhanced = self.enhancer.enhance(query);
        let query_vec = self.embedder.embed(&enhanced).await;
        let candidates = self.store.find_active(filters).await?;

        let threshold = if self.matcher.is_some() { self.config.semantic_threshold } else { self.config.semantic_only_threshold };
        let mut semantic = semantic_pass(&query_vec, &candidates, threshold);
        semantic.truncate(limit);

        let lexical: Vec<ScoredCandidate> = match &self.matcher {
            Some(matcher) => match matcher.find_matches(query, &candidates) {
                Ok(indexes) => indexes
                    .into_iter()
                    .filter_map(|i| candidates.get(i))
                    .take(limit)
                    .map(|d| ScoredCandidate::new(d.clone(), self.config.text_similarity, MatchType::Text))
                    .collect(),
                Err(e) => {
                    warn!(error = %e, "lexical pass failed; semantic hits only");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        debug!(candidates = candidates.len(), semantic = semantic.len(), lexical = lexical.len(), "ranked");
        Ok(Ranking { query: enhanced, hits: fuse(semantic, lexical, limit) })
    }
}

/// Merge two hit lists. Semantic hits are inserted first and win on id
/// collisions; the result is stably sorted by similarity (descending) and
/// cut to `limit`.
pub fn fuse(semantic: Vec<ScoredCandidate>, lexical: Vec<ScoredCandidate>, limit: usize) -> Vec<ScoredCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(semantic.len() + lexical.len());
    for hit in semantic.into_iter().chain(lexical) {
        if seen.insert(hit.document.id.clone()) { merged.push(hit); }
    }
    merged.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    merged.truncate(limit);
    merged
}

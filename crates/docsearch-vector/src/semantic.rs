use docsearch_core::types::{Document, MatchType, ScoredCandidate};

use crate::similarity::cosine_similarity;

/// Score every embedded candidate against `query`, keep those at or above
/// `threshold`, best first. Ties keep candidate order.
pub fn semantic_pass(query: &[f32], candidates: &[Document], threshold: f32) -> Vec<ScoredCandidate> {
    let mut hits: Vec<ScoredCandidate> = candidates
        .iter()
        .filter(|d| d.has_embedding() && d.embedding.len() == query.len())
        .filter_map(|d| {
            let similarity = cosine_similarity(query, &d.embedding);
            (similarity >= threshold).then(|| ScoredCandidate::new(d.clone(), similarity, MatchType::Semantic))
        })
        .collect();
    hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    hits
}

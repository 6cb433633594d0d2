//! Display-ready match records.

use crate::models::{ScoredMatch, SearchHit};

/// Build a [`ScoredMatch`] labelled `"{service_name} ({result_type})"`.
pub fn format_match(hit: &SearchHit, similarity: f64, service_name: &str) -> ScoredMatch {
    ScoredMatch {
        target_text: hit.target_text.clone(),
        similarity,
        label: format!("{} ({})", service_name, hit.result_type),
        source_text: hit.source_text.clone(),
    }
}

/// Pair hits with their similarities, keeping the backend's hit order.
///
/// Matches are never re-sorted by similarity. Extra entries on either side
/// are ignored.
pub fn format_matches(hits: &[SearchHit], similarities: &[f64], service_name: &str) -> Vec<ScoredMatch> {
    hits.iter()
        .zip(similarities)
        .map(|(hit, similarity)| format_match(hit, *similarity, service_name))
        .collect()
}

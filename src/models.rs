//! Core data models used throughout the engine.
//!
//! These types represent the translation units, backend documents, raw hits
//! and scored matches that flow through the indexing and lookup paths.

use serde::{Deserialize, Serialize};

/// A translated string handed over by the translation source.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationUnit {
    pub id: String,
    pub source_text: String,
    pub target_text: String,
    pub source_language: String,
    pub target_language: String,
    pub origin: String,
}

/// Document shape stored in the backend index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub source: String,
    pub target: String,
    pub source_language: String,
    pub target_language: String,
    pub origin: String,
}

/// A raw hit returned by the backend for a lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Backend relevance score. Only comparable within one result set.
    pub raw_score: f64,
    pub source_text: String,
    pub target_text: String,
    /// Backend document type (`_type`), shown in match labels.
    pub result_type: String,
}

/// A lookup result with a similarity percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    pub target_text: String,
    /// Similarity in `[0, 100]`, rounded to two decimals.
    pub similarity: f64,
    pub label: String,
    pub source_text: String,
}

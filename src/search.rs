//! Match queries against the backend index.
//!
//! The response is decoded through explicit schema types. Transport and
//! HTTP failures surface as [`TmError::SearchUnavailable`]; a response that
//! does not have the expected shape surfaces as [`TmError::Schema`], so
//! callers can tell an unreachable backend from an incompatible one.

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error};

use crate::backend::{BackendRequest, Method, RequestBody, Transport, TransportError};
use crate::error::{Result, TmError};
use crate::models::SearchHit;

/// Document type reported when the backend omits `_type` (Elasticsearch 7+).
const DEFAULT_RESULT_TYPE: &str = "_doc";

/// Restricts a lookup to one language pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageFilter {
    pub source_language: String,
    pub target_language: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Option<HitsEnvelope>,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Option<Vec<RawHit>>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_score")]
    score: Option<f64>,
    #[serde(rename = "_type")]
    doc_type: Option<String>,
    #[serde(rename = "_source")]
    source: Option<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    source: Option<String>,
    target: Option<String>,
}

/// Issues match queries for lookup text.
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    index: String,
}

impl SearchClient {
    pub fn new(transport: Arc<dyn Transport>, index: impl Into<String>) -> Self {
        Self {
            transport,
            index: index.into(),
        }
    }

    /// Run one match query on the `source` field and return the raw hits in
    /// backend order.
    pub fn search(&self, text: &str, filter: Option<&LanguageFilter>) -> Result<Vec<SearchHit>> {
        let request = BackendRequest::new(
            Method::Get,
            [self.index.as_str(), "_search"],
            RequestBody::Json(query_body(text, filter)),
        );

        let response = match self.transport.send(&request) {
            Ok(response) => response,
            Err(TransportError::Decode(message)) => return Err(TmError::Schema(message)),
            Err(e) => {
                error!(index = %self.index, error = %e, "Getting results from search backend failed");
                return Err(TmError::SearchUnavailable(e));
            }
        };

        let hits = parse_search_response(response)?;
        debug!(index = %self.index, hits = hits.len(), "search completed");
        Ok(hits)
    }
}

/// Request body for a lookup.
///
/// Without a filter this is exactly `{"query": {"match": {"source": text}}}`.
pub fn query_body(text: &str, filter: Option<&LanguageFilter>) -> Value {
    match filter {
        None => json!({ "query": { "match": { "source": text } } }),
        Some(filter) => json!({
            "query": {
                "bool": {
                    "must": { "match": { "source": text } },
                    "filter": [
                        { "term": { "source_language": filter.source_language } },
                        { "term": { "target_language": filter.target_language } }
                    ]
                }
            }
        }),
    }
}

/// Decode a search response into hits, failing closed on missing fields.
pub fn parse_search_response(response: Value) -> Result<Vec<SearchHit>> {
    let parsed: SearchResponse =
        serde_json::from_value(response).map_err(|e| TmError::Schema(e.to_string()))?;
    let raw_hits = parsed
        .hits
        .and_then(|envelope| envelope.hits)
        .ok_or_else(|| schema_error("response has no 'hits.hits' array".to_string()))?;

    raw_hits
        .into_iter()
        .enumerate()
        .map(|(i, raw)| -> Result<SearchHit> {
            let raw_score = raw
                .score
                .ok_or_else(|| schema_error(format!("hit {} is missing '_score'", i)))?;
            let source = raw
                .source
                .ok_or_else(|| schema_error(format!("hit {} is missing '_source'", i)))?;
            let source_text = source
                .source
                .ok_or_else(|| schema_error(format!("hit {} is missing '_source.source'", i)))?;
            let target_text = source
                .target
                .ok_or_else(|| schema_error(format!("hit {} is missing '_source.target'", i)))?;
            Ok(SearchHit {
                raw_score,
                source_text,
                target_text,
                result_type: raw
                    .doc_type
                    .unwrap_or_else(|| DEFAULT_RESULT_TYPE.to_string()),
            })
        })
        .collect()
}

fn schema_error(message: String) -> TmError {
    error!("{} in search backend results", message);
    TmError::Schema(message)
}

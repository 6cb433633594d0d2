//! Index writes: single upserts, bulk batches and origin maintenance.
//!
//! The two write paths have opposite failure semantics:
//!
//! - [`IndexWriter::upsert_one`] is best-effort. It is called from live
//!   translation saves, so a failure is logged and reported as a
//!   [`WriteOutcome::Failed`] value but never raised. A document without
//!   source text is never sent and comes back as [`WriteOutcome::Skipped`].
//! - [`IndexWriter::upsert_batch`] fails fast. Documents go out in groups of
//!   at most [`MAX_BATCH_SIZE`], strictly in order. The first failing group
//!   stops the upload; groups already sent stay committed in the backend.
//!
//! ```text
//! batch:   1        2        3
//!        [ok]    [FAIL]   (never sent)
//!          └─ committed = 1
//! ```

use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::backend::{BackendRequest, Method, RequestBody, Transport, TransportError};
use crate::config::{BackendConfig, MAX_BATCH_SIZE};
use crate::error::{Result, TmError};
use crate::models::IndexDocument;

/// Maximum number of distinct origins returned by [`IndexWriter::origins`].
const MAX_ORIGINS: usize = 10_000;

/// Result of a best-effort single-document write.
#[derive(Debug)]
pub enum WriteOutcome {
    Indexed,
    /// Nothing was sent: the document has no source text.
    Skipped,
    Failed(TmError),
}

impl WriteOutcome {
    pub fn is_indexed(&self) -> bool {
        matches!(self, WriteOutcome::Indexed)
    }
}

/// Cooperative cancellation flag checked before each bulk batch.
///
/// Clones share the same flag, so one clone can be handed to another thread
/// (for example a signal handler) while the import holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Totals of a successful bulk upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkSummary {
    pub batches: usize,
    pub documents: usize,
}

pub struct IndexWriter {
    transport: Arc<dyn Transport>,
    index: String,
    doc_type: String,
    batch_size: usize,
}

impl IndexWriter {
    /// Create a writer for the configured index.
    ///
    /// `batch_size` is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(transport: Arc<dyn Transport>, config: &BackendConfig, batch_size: usize) -> Self {
        Self {
            transport,
            index: config.index.clone(),
            doc_type: config.doc_type.clone(),
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Insert or replace one document under a stable id.
    ///
    /// Sends `PUT {index}/{doc_type}/{id}`. Never returns an error: failures
    /// are logged at WARN and reported as [`WriteOutcome::Failed`] holding a
    /// [`TmError::TransientWrite`]. Documents with an empty `source` are
    /// skipped without a request.
    pub fn upsert_one(&self, id: &str, document: &IndexDocument) -> WriteOutcome {
        if document.source.is_empty() {
            debug!(index = %self.index, id, "Skipping index update without source text");
            return WriteOutcome::Skipped;
        }

        let request = BackendRequest::new(
            Method::Put,
            [self.index.as_str(), self.doc_type.as_str(), id],
            RequestBody::Json(document_json(document)),
        );
        match self.transport.send(&request) {
            Ok(_) => WriteOutcome::Indexed,
            Err(e) => {
                warn!(index = %self.index, id, error = %e, "Ignoring failed index update");
                WriteOutcome::Failed(TmError::TransientWrite(e))
            }
        }
    }

    /// Upload documents in ordered bulk batches, stopping at the first failure.
    ///
    /// `cancel` is checked before each batch. An empty slice sends nothing.
    ///
    /// # Errors
    ///
    /// - [`TmError::BulkWrite`] when a batch request fails or the backend
    ///   reports item errors. `committed` batches stay in the index.
    /// - [`TmError::Cancelled`] when `cancel` was set between batches.
    pub fn upsert_batch(&self, documents: &[IndexDocument], cancel: &CancelToken) -> Result<BulkSummary> {
        let total = documents.len().div_ceil(self.batch_size);
        let mut summary = BulkSummary::default();

        for (batch, group) in documents.chunks(self.batch_size).enumerate() {
            if cancel.is_cancelled() {
                warn!(index = %self.index, committed = summary.batches, "bulk upload cancelled");
                return Err(TmError::Cancelled {
                    committed: summary.batches,
                });
            }

            if let Err(reason) = self.send_bulk(group) {
                warn!(
                    index = %self.index,
                    batch = batch + 1,
                    of = total,
                    committed = summary.batches,
                    %reason,
                    "bulk batch failed, aborting remaining batches"
                );
                return Err(TmError::BulkWrite {
                    batch,
                    committed: summary.batches,
                    reason,
                });
            }

            summary.batches += 1;
            summary.documents += group.len();
            info!(
                index = %self.index,
                batch = batch + 1,
                of = total,
                documents = group.len(),
                "bulk batch committed"
            );
        }

        Ok(summary)
    }

    fn send_bulk(&self, group: &[IndexDocument]) -> std::result::Result<(), String> {
        let request = BackendRequest::new(
            Method::Post,
            [self.index.as_str(), "_bulk"],
            RequestBody::NdJson(encode_bulk(group)),
        );
        let response = self.transport.send(&request).map_err(|e| e.to_string())?;
        if response.get("errors").and_then(Value::as_bool) == Some(true) {
            let detail = first_item_error(&response).unwrap_or_else(|| "unknown item error".to_string());
            return Err(format!("backend rejected bulk items: {}", detail));
        }
        Ok(())
    }

    /// Delete every document imported from `origin`. Returns the number deleted.
    pub fn delete_origin(&self, origin: &str) -> Result<u64> {
        let request = BackendRequest::new(
            Method::Post,
            [self.index.as_str(), "_delete_by_query"],
            RequestBody::Json(json!({ "query": { "term": { "origin": origin } } })),
        );
        let response = self.transport.send(&request).map_err(backend_error)?;
        let deleted = response
            .get("deleted")
            .and_then(Value::as_u64)
            .ok_or_else(|| TmError::Schema("delete response has no 'deleted' count".to_string()))?;
        info!(index = %self.index, origin, deleted, "deleted documents by origin");
        Ok(deleted)
    }

    /// Delete every document in the index. Returns the number deleted.
    ///
    /// The index itself and its mapping are left in place.
    pub fn empty(&self) -> Result<u64> {
        let request = BackendRequest::new(
            Method::Post,
            [self.index.as_str(), "_delete_by_query"],
            RequestBody::Json(json!({ "query": { "match_all": {} } })),
        );
        let response = self.transport.send(&request).map_err(backend_error)?;
        let deleted = response
            .get("deleted")
            .and_then(Value::as_u64)
            .ok_or_else(|| TmError::Schema("delete response has no 'deleted' count".to_string()))?;
        info!(index = %self.index, deleted, "emptied translation memory");
        Ok(deleted)
    }

    /// Number of documents in the index.
    pub fn count(&self) -> Result<u64> {
        let request = BackendRequest::new(
            Method::Get,
            [self.index.as_str(), "_count"],
            RequestBody::Empty,
        );
        let response = self.transport.send(&request).map_err(backend_error)?;
        response
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| TmError::Schema("count response has no 'count' field".to_string()))
    }

    /// Distinct origins present in the index, most frequent first.
    pub fn origins(&self) -> Result<Vec<String>> {
        let request = BackendRequest::new(
            Method::Get,
            [self.index.as_str(), "_search"],
            RequestBody::Json(json!({
                "size": 0,
                "aggs": { "origins": { "terms": { "field": "origin", "size": MAX_ORIGINS } } }
            })),
        );
        let response = self.transport.send(&request).map_err(backend_error)?;
        let buckets = response
            .pointer("/aggregations/origins/buckets")
            .and_then(Value::as_array)
            .ok_or_else(|| TmError::Schema("response has no origin aggregation".to_string()))?;

        buckets
            .iter()
            .map(|bucket| {
                bucket
                    .get("key")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| TmError::Schema("origin bucket has no string 'key'".to_string()))
            })
            .collect()
    }
}

/// JSON body shared by single upserts and bulk document lines.
pub fn document_json(document: &IndexDocument) -> Value {
    json!({
        "source": document.source,
        "target": document.target,
        "source_language": document.source_language,
        "target_language": document.target_language,
        "origin": document.origin,
    })
}

/// Encode documents as bulk NDJSON: an `{"index":{}}` action line followed
/// by the document line, each newline-terminated.
pub fn encode_bulk(documents: &[IndexDocument]) -> String {
    let mut body = String::new();
    for document in documents {
        body.push_str("{\"index\":{}}\n");
        body.push_str(&document_json(document).to_string());
        body.push('\n');
    }
    body
}

fn first_item_error(response: &Value) -> Option<String> {
    response
        .get("items")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("index")?.get("error"))
        .map(|error| {
            error
                .get("reason")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string())
        })
        .next()
}

fn backend_error(e: TransportError) -> TmError {
    match e {
        TransportError::Decode(message) => TmError::Schema(message),
        other => TmError::Backend(other),
    }
}

//! TMX import pipeline.
//!
//! Drives one import run through its stages:
//!
//! ```text
//! parse ──▶ resolve languages ──▶ build documents ──▶ bulk upload (batches)
//!   │              │                                        │
//!   └── Aborted ◀──┘ (nothing written)          Aborted / Cancelled
//!                                               (earlier batches kept)
//! ```
//!
//! All documents are built before the first request is sent, so parse and
//! language errors never leave a partial import behind. Only a failing or
//! cancelled bulk batch can, and the outcome reports how many batches were
//! committed.

use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::document;
use crate::error::{Result, TmError};
use crate::language::LanguageRegistry;
use crate::models::{IndexDocument, TranslationUnit};
use crate::tmx::{parse_tmx_file, TmxFile};
use crate::writer::{CancelToken, IndexWriter};

/// Counters for one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// `<tu>` elements read from the file.
    pub units: usize,
    /// Units without text for the declared source language.
    pub skipped_units: usize,
    /// Documents built (one per unit and target language).
    pub documents: usize,
    /// Bulk batches confirmed by the backend.
    pub batches_committed: usize,
}

/// Terminal state of an import run.
#[derive(Debug)]
pub enum ImportOutcome {
    /// Every batch was committed.
    Completed(ImportStats),
    /// Parsing, language resolution or a bulk batch failed.
    Aborted { error: TmError, stats: ImportStats },
    /// The cancel token was set between batches.
    Cancelled(ImportStats),
}

impl ImportOutcome {
    pub fn stats(&self) -> &ImportStats {
        match self {
            ImportOutcome::Completed(stats) | ImportOutcome::Cancelled(stats) => stats,
            ImportOutcome::Aborted { stats, .. } => stats,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ImportOutcome::Completed(_))
    }

    /// Convert into a `Result`, treating cancellation as an error.
    pub fn into_result(self) -> Result<ImportStats> {
        match self {
            ImportOutcome::Completed(stats) => Ok(stats),
            ImportOutcome::Aborted { error, .. } => Err(error),
            ImportOutcome::Cancelled(stats) => Err(TmError::Cancelled {
                committed: stats.batches_committed,
            }),
        }
    }
}

/// Documents built from a parsed file.
#[derive(Debug, Clone, Default)]
pub struct DocumentSet {
    pub documents: Vec<IndexDocument>,
    pub units: usize,
    pub skipped_units: usize,
}

/// Imports TMX files into the backend index.
pub struct TmxImporter<'a> {
    registry: &'a LanguageRegistry,
    writer: &'a IndexWriter,
}

impl<'a> TmxImporter<'a> {
    pub fn new(registry: &'a LanguageRegistry, writer: &'a IndexWriter) -> Self {
        Self { registry, writer }
    }

    /// Import one file. Documents are tagged with the file's base name.
    pub fn import_file(
        &self,
        path: &Path,
        langmap: Option<&HashMap<String, String>>,
        cancel: &CancelToken,
    ) -> ImportOutcome {
        let origin = origin_for(path);
        info!(path = %path.display(), %origin, "importing TMX file");

        let tmx = match parse_tmx_file(path) {
            Ok(tmx) => tmx,
            Err(error) => {
                warn!(path = %path.display(), %error, "TMX import aborted before upload");
                return ImportOutcome::Aborted {
                    error,
                    stats: ImportStats::default(),
                };
            }
        };
        self.import_parsed(&tmx, &origin, langmap, cancel)
    }

    /// Import an already parsed file under the given origin.
    pub fn import_parsed(
        &self,
        tmx: &TmxFile,
        origin: &str,
        langmap: Option<&HashMap<String, String>>,
        cancel: &CancelToken,
    ) -> ImportOutcome {
        let mut stats = ImportStats {
            units: tmx.units.len(),
            ..ImportStats::default()
        };

        let set = match build_documents(tmx, origin, self.registry, langmap) {
            Ok(set) => set,
            Err(error) => {
                warn!(%origin, %error, "TMX import aborted before upload");
                return ImportOutcome::Aborted { error, stats };
            }
        };
        stats.skipped_units = set.skipped_units;
        stats.documents = set.documents.len();

        let outcome = match self.writer.upsert_batch(&set.documents, cancel) {
            Ok(summary) => {
                stats.batches_committed = summary.batches;
                ImportOutcome::Completed(stats)
            }
            Err(TmError::Cancelled { committed }) => {
                stats.batches_committed = committed;
                ImportOutcome::Cancelled(stats)
            }
            Err(error) => {
                if let TmError::BulkWrite { committed, .. } = &error {
                    stats.batches_committed = *committed;
                }
                ImportOutcome::Aborted { error, stats }
            }
        };

        info!(
            %origin,
            units = stats.units,
            skipped = stats.skipped_units,
            documents = stats.documents,
            batches = stats.batches_committed,
            completed = outcome.is_completed(),
            "TMX import finished"
        );
        outcome
    }
}

/// Build one document per (unit, target language) pair.
///
/// Units without non-empty text for the declared source language are
/// skipped. Empty target segments are not indexed. Target languages are
/// resolved once per distinct raw tag.
///
/// # Errors
///
/// [`TmError::UnknownLanguage`] if the source language or any indexed target
/// language cannot be resolved.
pub fn build_documents(
    tmx: &TmxFile,
    origin: &str,
    registry: &LanguageRegistry,
    langmap: Option<&HashMap<String, String>>,
) -> Result<DocumentSet> {
    let source_language = registry.resolve(&tmx.source_language, langmap)?;
    let mut resolved: HashMap<&str, String> = HashMap::new();
    let mut set = DocumentSet {
        units: tmx.units.len(),
        ..DocumentSet::default()
    };

    for (index, unit) in tmx.units.iter().enumerate() {
        let source_text = unit
            .variants
            .iter()
            .find(|(lang, _)| lang.eq_ignore_ascii_case(&tmx.source_language))
            .map(|(_, text)| text.as_str())
            .filter(|text| !text.is_empty());
        let Some(source_text) = source_text else {
            debug!(%origin, unit = index, "skipping unit without source text");
            set.skipped_units += 1;
            continue;
        };

        for (lang, text) in &unit.variants {
            if lang.eq_ignore_ascii_case(&tmx.source_language) || text.is_empty() {
                continue;
            }
            let target_language = match resolved.get(lang.as_str()) {
                Some(code) => code.clone(),
                None => {
                    let code = registry.resolve(lang, langmap)?;
                    resolved.insert(lang.as_str(), code.clone());
                    code
                }
            };

            let translation = TranslationUnit {
                id: unit.id.clone().unwrap_or_else(|| index.to_string()),
                source_text: source_text.to_string(),
                target_text: text.clone(),
                source_language: source_language.clone(),
                target_language: target_language.clone(),
                origin: origin.to_string(),
            };
            set.documents
                .push(document::build(&translation, &target_language, origin));
        }
    }

    Ok(set)
}

/// Origin label for an imported file: its base name.
pub fn origin_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
